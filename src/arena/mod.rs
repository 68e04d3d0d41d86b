use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::constants::ARRAY_SUFFIX;
use crate::{Error, Result};

/// Index of a node inside its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// `None` once the index no longer fits in a `u32`.
    fn try_new(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(NodeId)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of an attribute inside its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttrId(u32);

impl AttrId {
    fn try_new(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(AttrId)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
pub(crate) struct NodeSlot {
    pub name: SmolStr,
    pub parent: Option<NodeId>,
    pub attributes: Vec<AttrId>,
    pub nodes: Vec<NodeId>,
    pub is_array: bool,
    pub size_attr: Option<AttrId>,
}

#[derive(Debug)]
pub(crate) struct AttrSlot {
    pub name: SmolStr,
    pub value: String,
    pub parent: NodeId,
}

/// Slot storage for one document. Removed elements leave a tombstone so
/// ids held by callers never alias a newer element; slots are reclaimed only
/// by `clear`. At most `u32::MAX + 1` nodes and as many attributes can be
/// created between two clears.
#[derive(Debug)]
pub(crate) struct Arena {
    nodes: Vec<Option<NodeSlot>>,
    attrs: Vec<Option<AttrSlot>>,
}

impl Arena {
    pub fn new() -> Self {
        let mut arena = Self {
            nodes: Vec::new(),
            attrs: Vec::new(),
        };
        arena.clear();
        arena
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.attrs.clear();
        self.nodes.push(Some(NodeSlot {
            name: SmolStr::default(),
            parent: None,
            attributes: Vec::new(),
            nodes: Vec::new(),
            is_array: false,
            size_attr: None,
        }));
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeSlot> {
        self.nodes.get(id.index())?.as_ref()
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeSlot> {
        self.nodes.get_mut(id.index())?.as_mut()
    }

    pub fn attr(&self, id: AttrId) -> Option<&AttrSlot> {
        self.attrs.get(id.index())?.as_ref()
    }

    pub fn attr_mut(&mut self, id: AttrId) -> Option<&mut AttrSlot> {
        self.attrs.get_mut(id.index())?.as_mut()
    }

    pub fn is_array(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|slot| slot.is_array)
    }

    /// Appends a node to `parent`. The caller guarantees `parent` is live.
    pub fn push_node(
        &mut self,
        parent: NodeId,
        name: SmolStr,
        is_array: bool,
    ) -> Result<NodeId> {
        let id = NodeId::try_new(self.nodes.len())
            .ok_or_else(|| Error::tree("too many nodes in one document"))?;
        self.nodes.push(Some(NodeSlot {
            name,
            parent: Some(parent),
            attributes: Vec::new(),
            nodes: Vec::new(),
            is_array,
            size_attr: None,
        }));
        if let Some(slot) = self.node_mut(parent) {
            slot.nodes.push(id);
        }
        Ok(id)
    }

    /// Appends an attribute to `parent`. The caller guarantees `parent` is live.
    pub fn push_attr(
        &mut self,
        parent: NodeId,
        name: SmolStr,
        value: String,
    ) -> Result<AttrId> {
        let id = AttrId::try_new(self.attrs.len())
            .ok_or_else(|| Error::tree("too many attributes in one document"))?;
        self.attrs.push(Some(AttrSlot {
            name,
            value,
            parent,
        }));
        if let Some(slot) = self.node_mut(parent) {
            slot.attributes.push(id);
        }
        Ok(id)
    }

    pub fn release_node(&mut self, id: NodeId) -> Option<NodeSlot> {
        if id == self.root() {
            return None;
        }
        self.nodes.get_mut(id.index())?.take()
    }

    pub fn release_attr(&mut self, id: AttrId) -> Option<AttrSlot> {
        self.attrs.get_mut(id.index())?.take()
    }

    #[cfg(test)]
    pub fn live_nodes(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    #[cfg(test)]
    pub fn live_attrs(&self) -> usize {
        self.attrs.iter().filter(|slot| slot.is_some()).count()
    }

    /// Path under which children of `id` are addressed: ancestor names joined
    /// with `.`, array elements glued to their array's name as `[i]`.
    pub fn child_node_path(&self, id: NodeId) -> String {
        let mut chain: SmallVec<[NodeId; 16]> = SmallVec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(slot) = self.node(current) else {
                break;
            };
            if slot.parent.is_none() {
                break;
            }
            chain.push(current);
            cursor = slot.parent;
        }

        let mut path = String::new();
        for &current in chain.iter().rev() {
            let Some(slot) = self.node(current) else {
                continue;
            };
            let in_array = slot.parent.is_some_and(|parent| self.is_array(parent));
            if !in_array && !path.is_empty() {
                path.push('.');
            }
            path.push_str(&slot.name);
        }
        path
    }

    /// Key of a node in the node index.
    pub fn node_key(&self, id: NodeId) -> String {
        let mut key = self.child_node_path(id);
        if self.is_array(id) {
            key.push_str(ARRAY_SUFFIX);
        }
        key
    }

    /// Key of an attribute in the attribute index.
    pub fn attr_key(&self, id: AttrId) -> String {
        let Some(slot) = self.attr(id) else {
            return String::new();
        };
        join_key(&self.node_key(slot.parent), &slot.name)
    }
}

pub(crate) fn join_key(path: &str, name: &str) -> String {
    if path.is_empty() {
        return name.to_string();
    }
    let mut key = String::with_capacity(path.len() + 1 + name.len());
    key.push_str(path);
    key.push('.');
    key.push_str(name);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(value: &str) -> SmolStr {
        SmolStr::new(value)
    }

    #[rstest::rstest]
    fn test_root_has_empty_paths() {
        let arena = Arena::new();
        let root = arena.root();
        assert_eq!(arena.child_node_path(root), "");
        assert_eq!(arena.node_key(root), "");
        assert!(arena.node(root).is_some_and(|slot| slot.parent.is_none()));
    }

    #[rstest::rstest]
    fn test_nested_paths() {
        let mut arena = Arena::new();
        let root = arena.root();
        let outer = arena.push_node(root, name("outer"), false).expect("push");
        let inner = arena.push_node(outer, name("inner"), false).expect("push");
        let attr = arena.push_attr(inner, name("x"), "1".to_string()).expect("push");
        let top = arena.push_attr(root, name("top"), "2".to_string()).expect("push");
        assert_eq!(arena.node_key(outer), "outer");
        assert_eq!(arena.node_key(inner), "outer.inner");
        assert_eq!(arena.attr_key(attr), "outer.inner.x");
        assert_eq!(arena.attr_key(top), "top");
    }

    #[rstest::rstest]
    fn test_array_paths() {
        let mut arena = Arena::new();
        let root = arena.root();
        let wrap = arena.push_node(root, name("a"), false).expect("push");
        let array = arena.push_node(wrap, name("b"), true).expect("push");
        let element = arena.push_node(array, name("[0]"), false).expect("push");
        let leaf = arena.push_node(element, name("c"), false).expect("push");
        let attr = arena.push_attr(leaf, name("x"), String::new()).expect("push");
        let size = arena.push_attr(array, name("size"), "1".to_string()).expect("push");
        assert_eq!(arena.node_key(array), "a.b[]");
        assert_eq!(arena.child_node_path(array), "a.b");
        assert_eq!(arena.node_key(element), "a.b[0]");
        assert_eq!(arena.node_key(leaf), "a.b[0].c");
        assert_eq!(arena.attr_key(attr), "a.b[0].c.x");
        assert_eq!(arena.attr_key(size), "a.b[].size");
    }

    #[rstest::rstest]
    fn test_nested_array_paths() {
        let mut arena = Arena::new();
        let root = arena.root();
        let outer = arena.push_node(root, name("m"), true).expect("push");
        let row = arena.push_node(outer, name("[1]"), false).expect("push");
        let inner = arena.push_node(row, name("cells"), true).expect("push");
        let cell = arena.push_node(inner, name("[0]"), false).expect("push");
        assert_eq!(arena.node_key(inner), "m[1].cells[]");
        assert_eq!(arena.node_key(cell), "m[1].cells[0]");
    }

    #[rstest::rstest]
    fn test_release_leaves_tombstone() {
        let mut arena = Arena::new();
        let root = arena.root();
        let node = arena.push_node(root, name("n"), false).expect("push");
        let attr = arena.push_attr(node, name("a"), "v".to_string()).expect("push");
        assert!(arena.release_attr(attr).is_some());
        assert!(arena.release_node(node).is_some());
        assert!(arena.node(node).is_none());
        assert!(arena.attr(attr).is_none());
        assert!(arena.release_node(root).is_none());
        assert_eq!(arena.live_nodes(), 1);
        assert_eq!(arena.live_attrs(), 0);
    }

    #[cfg(target_pointer_width = "64")]
    #[rstest::rstest]
    fn test_ids_stop_at_u32_range() {
        let last = u32::MAX as usize;
        assert_eq!(NodeId::try_new(last).map(NodeId::index), Some(last));
        assert!(NodeId::try_new(last + 1).is_none());
        assert!(AttrId::try_new(last + 1).is_none());
    }

    #[rstest::rstest]
    fn test_clear_resets_to_root() {
        let mut arena = Arena::new();
        let root = arena.root();
        arena.push_node(root, name("n"), false).expect("push");
        arena.clear();
        assert_eq!(arena.live_nodes(), 1);
        assert!(arena.node(arena.root()).is_some_and(|slot| slot.nodes.is_empty()));
    }
}
