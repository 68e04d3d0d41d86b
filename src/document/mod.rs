mod ser;
mod view;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use smallvec::SmallVec;
use smol_str::SmolStr;
use tracing::{debug, trace};

use crate::arena::{Arena, AttrId, NodeId};
use crate::constants::{
    is_array_name, ARRAY_SIZE_NAME, ARRAY_SUFFIX, CONFIG_NODE_NAME, DEFAULT_LOCALE,
    DEFAULT_VERSION,
};
use crate::text::{is_valid_attr_name, is_valid_node_name};
use crate::{decode, encode, Error, FormatMode, LoadOptions, Result};

pub use view::{AttrRef, NodeRef};

/// Contents of a `!CONFIG` meta-node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigHeader {
    pub version: String,
    /// Upper-cased charset label.
    pub locale: String,
}

/// A parsed configuration: the element tree plus flat indexes from path IDs
/// to attributes and nodes.
///
/// Attribute IDs look like `server.ports[1].value`; node IDs like
/// `server.ports[]` (arrays) or `server.ports[1]` (their elements). When two
/// elements share an ID, the index keeps the one registered last.
#[derive(Debug)]
pub struct Document {
    arena: Arena,
    attr_index: HashMap<String, AttrId>,
    node_index: HashMap<String, NodeId>,
    header: Option<ConfigHeader>,
    locale: String,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            attr_index: HashMap::new(),
            node_index: HashMap::new(),
            header: None,
            locale: DEFAULT_LOCALE.to_string(),
        }
    }

    /// Drops every element, both indexes and the header.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.attr_index.clear();
        self.node_index.clear();
        self.header = None;
        self.locale = DEFAULT_LOCALE.to_string();
    }

    pub fn root_id(&self) -> NodeId {
        self.arena.root()
    }

    pub fn root(&self) -> NodeRef<'_> {
        self.node_by_id(self.root_id())
            .expect("document always has a root node")
    }

    /// Replaces the contents with a document read from `reader`.
    ///
    /// On failure the document is left empty.
    pub fn load<R: Read>(&mut self, reader: R, options: &LoadOptions) -> Result<()> {
        self.load_source(reader, options, true)
    }

    /// Loads already decoded text. A `!CONFIG` locale is recorded but does
    /// not affect decoding.
    pub fn load_str(&mut self, input: &str) -> Result<()> {
        self.load_source(input.as_bytes(), &LoadOptions::default(), false)
    }

    pub fn load_slice(&mut self, input: &[u8], options: &LoadOptions) -> Result<()> {
        self.load(input, options)
    }

    pub fn load_path<P: AsRef<Path>>(&mut self, path: P, options: &LoadOptions) -> Result<()> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening document");
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) => {
                self.clear();
                return Err(err.into());
            }
        };
        self.load(BufReader::new(file), options)
    }

    fn load_source<R: Read>(
        &mut self,
        source: R,
        options: &LoadOptions,
        follow_header: bool,
    ) -> Result<()> {
        self.clear();
        let result = decode::load_into(self, source, options, follow_header);
        if let Err(err) = &result {
            debug!("load failed\n{}", err.diagnostic());
            self.clear();
        }
        result
    }

    pub fn save_to_string(&self, mode: FormatMode) -> String {
        encode::to_string(self, mode)
    }

    /// Rendered text encoded for output: with the header charset in `File`
    /// mode when a header is present, UTF-8 otherwise.
    pub fn save_to_bytes(&self, mode: FormatMode) -> Result<Vec<u8>> {
        encode::to_vec(self, mode)
    }

    pub fn save<W: Write>(&self, writer: W, mode: FormatMode) -> Result<()> {
        encode::to_writer(writer, self, mode)
    }

    /// Writes the document to `path` in `File` mode.
    pub fn save_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        self.save(BufWriter::new(file), FormatMode::File)
    }

    pub fn header(&self) -> Option<&ConfigHeader> {
        self.header.as_ref()
    }

    pub fn has_config_header(&self) -> bool {
        self.header.is_some()
    }

    pub fn version(&self) -> Option<&str> {
        self.header.as_ref().map(|header| header.version.as_str())
    }

    /// Charset the document was decoded with, or the header's locale.
    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn set_config(&mut self, version: impl Into<String>, locale: &str) {
        let locale = match locale.trim() {
            "" => DEFAULT_LOCALE.to_string(),
            label => label.to_uppercase(),
        };
        self.set_header(ConfigHeader {
            version: version.into(),
            locale,
        });
    }

    pub fn set_default_config(&mut self) {
        self.set_config(DEFAULT_VERSION, DEFAULT_LOCALE);
    }

    pub(crate) fn set_header(&mut self, header: ConfigHeader) {
        debug!(version = %header.version, locale = %header.locale, "config header");
        self.locale = header.locale.clone();
        self.header = Some(header);
    }

    pub(crate) fn set_locale(&mut self, locale: String) {
        self.locale = locale;
    }

    pub fn attr(&self, path: &str) -> Option<AttrRef<'_>> {
        let id = *self.attr_index.get(path)?;
        self.attr_by_id(id)
    }

    /// Node by ID. An array may also be addressed without its `[]` suffix.
    pub fn node(&self, path: &str) -> Option<NodeRef<'_>> {
        let id = match self.node_index.get(path) {
            Some(id) => *id,
            None if !path.is_empty() && !path.ends_with(ARRAY_SUFFIX) => {
                let mut key = String::with_capacity(path.len() + ARRAY_SUFFIX.len());
                key.push_str(path);
                key.push_str(ARRAY_SUFFIX);
                *self.node_index.get(&key)?
            }
            None => return None,
        };
        self.node_by_id(id)
    }

    pub fn node_by_id(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.arena.node(id).map(|slot| NodeRef::new(self, id, slot))
    }

    pub fn attr_by_id(&self, id: AttrId) -> Option<AttrRef<'_>> {
        self.arena.attr(id).map(|slot| AttrRef::new(self, id, slot))
    }

    pub fn contains_key(&self, path: &str) -> bool {
        self.attr_index.contains_key(path)
    }

    /// Attribute index entries as `(id, value)`, sorted by id.
    pub fn keys(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .attr_index
            .iter()
            .filter_map(|(key, id)| {
                self.arena
                    .attr(*id)
                    .map(|slot| (key.as_str(), slot.value.as_str()))
            })
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Node index entries, sorted.
    pub fn node_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.node_index.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn key_count(&self) -> usize {
        self.attr_index.len()
    }

    pub fn node_key_count(&self) -> usize {
        self.node_index.len()
    }

    pub(crate) fn node_key(&self, id: NodeId) -> String {
        self.arena.node_key(id)
    }

    pub(crate) fn child_node_path(&self, id: NodeId) -> String {
        self.arena.child_node_path(id)
    }

    pub(crate) fn attr_key(&self, id: AttrId) -> String {
        self.arena.attr_key(id)
    }

    pub(crate) fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.arena.node(id)?.parent
    }

    pub(crate) fn is_array_node(&self, id: NodeId) -> bool {
        self.arena.is_array(id)
    }

    pub(crate) fn node_name(&self, id: NodeId) -> Option<&str> {
        self.arena.node(id).map(|slot| slot.name.as_str())
    }

    pub(crate) fn attr_name(&self, id: AttrId) -> Option<&str> {
        self.arena.attr(id).map(|slot| slot.name.as_str())
    }

    pub(crate) fn attr_value_by_key(&self, key: &str) -> Option<&str> {
        let id = self.attr_index.get(key)?;
        self.arena.attr(*id).map(|slot| slot.value.as_str())
    }

    /// Appends a node to `parent`.
    ///
    /// A name ending in `[]` creates an array node with a `size` attribute.
    /// Children of an array are always named `[index]`; `name` is ignored
    /// for them. `!CONFIG` is reserved for the header, see
    /// [`Document::set_config`].
    pub fn create_node(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        let is_element = self.arena.is_array(parent);
        if !is_element && name.trim_end_matches(ARRAY_SUFFIX) == CONFIG_NODE_NAME {
            return Err(Error::tree(format!(
                "node name [{name}] is reserved for the config header"
            )));
        }
        self.append_node(parent, name)
    }

    /// `create_node` without the reserved-name check; the parser hands
    /// `!CONFIG` to the header protocol through here.
    pub(crate) fn append_node(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        let Some(parent_slot) = self.arena.node(parent) else {
            return Err(Error::tree("parent node does not exist"));
        };
        let (name, is_array) = if parent_slot.is_array {
            (element_name(parent_slot.nodes.len()), false)
        } else {
            if !is_valid_node_name(name) {
                return Err(Error::tree(format!("invalid node name [{name}]")));
            }
            if is_array_name(name) {
                (SmolStr::new(&name[..name.len() - ARRAY_SUFFIX.len()]), true)
            } else {
                (SmolStr::new(name), false)
            }
        };

        let id = self.arena.push_node(parent, name, is_array)?;
        if is_array {
            let size =
                self.arena
                    .push_attr(id, SmolStr::new_static(ARRAY_SIZE_NAME), "0".to_string())?;
            if let Some(slot) = self.arena.node_mut(id) {
                slot.size_attr = Some(size);
            }
            self.register_attr(size);
        }
        self.register_node(id);
        self.refresh_size(parent);
        Ok(id)
    }

    /// Appends an attribute to `parent`. Array nodes only carry their
    /// `size`; other attributes are rejected.
    pub fn create_attribute(
        &mut self,
        parent: NodeId,
        name: &str,
        value: impl Into<String>,
    ) -> Result<AttrId> {
        let Some(parent_slot) = self.arena.node(parent) else {
            return Err(Error::tree("parent node does not exist"));
        };
        if parent_slot.is_array {
            return Err(Error::tree(format!(
                "array node [{}] can not hold attributes",
                self.arena.node_key(parent)
            )));
        }
        if !is_valid_attr_name(name) {
            return Err(Error::tree(format!("invalid attribute name [{name}]")));
        }
        let id = self
            .arena
            .push_attr(parent, SmolStr::new(name), value.into())?;
        self.register_attr(id);
        Ok(id)
    }

    /// Overwrites the value of an existing attribute.
    pub fn set_key(&mut self, path: &str, value: impl Into<String>) -> Result<()> {
        let Some(&id) = self.attr_index.get(path) else {
            return Err(Error::key_not_found(path));
        };
        self.set_value(id, value)
    }

    pub fn set_value(&mut self, id: AttrId, value: impl Into<String>) -> Result<()> {
        if self.is_size_attr(id) {
            return Err(Error::tree(format!(
                "[{}] is maintained by its array",
                self.arena.attr_key(id)
            )));
        }
        let Some(slot) = self.arena.attr_mut(id) else {
            return Err(Error::tree("attribute does not exist"));
        };
        slot.value = value.into();
        Ok(())
    }

    /// Detaches an attribute and drops its index entry.
    pub fn remove_attribute(&mut self, id: AttrId) -> Result<()> {
        let Some(slot) = self.arena.attr(id) else {
            return Err(Error::tree("attribute does not exist"));
        };
        let parent = slot.parent;
        if self.is_size_attr(id) {
            return Err(Error::tree("size attribute of an array can not be removed"));
        }
        trace!(key = %self.arena.attr_key(id), "removing attribute");
        self.unregister_attr(id);
        if let Some(slot) = self.arena.node_mut(parent) {
            slot.attributes.retain(|attr| *attr != id);
        }
        self.arena.release_attr(id);
        Ok(())
    }

    /// Detaches a node with its whole subtree.
    ///
    /// When the node is an array element, the following elements are
    /// renumbered and re-indexed and the array's `size` drops by one.
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        if id == self.root_id() {
            return Err(Error::tree("root node can not be removed"));
        }
        let Some(parent) = self.parent_of(id) else {
            return Err(Error::tree("node does not exist"));
        };
        let Some(position) = self
            .arena
            .node(parent)
            .and_then(|slot| slot.nodes.iter().position(|node| *node == id))
        else {
            return Err(Error::tree("node is not attached to its parent"));
        };
        trace!(key = %self.arena.node_key(id), "removing node");

        let followers: SmallVec<[NodeId; 8]> = if self.arena.is_array(parent) {
            self.arena
                .node(parent)
                .map(|slot| slot.nodes[position + 1..].iter().copied().collect())
                .unwrap_or_default()
        } else {
            SmallVec::new()
        };
        for &follower in &followers {
            self.unregister_subtree(follower);
        }
        self.unregister_subtree(id);
        self.release_subtree(id);

        if let Some(slot) = self.arena.node_mut(parent) {
            slot.nodes.remove(position);
        }
        for (offset, &follower) in followers.iter().enumerate() {
            if let Some(slot) = self.arena.node_mut(follower) {
                slot.name = element_name(position + offset);
            }
            self.register_subtree(follower);
        }
        self.refresh_size(parent);
        Ok(())
    }

    fn is_size_attr(&self, id: AttrId) -> bool {
        self.arena
            .attr(id)
            .and_then(|slot| self.arena.node(slot.parent))
            .is_some_and(|parent| parent.size_attr == Some(id))
    }

    fn refresh_size(&mut self, node: NodeId) {
        let Some(slot) = self.arena.node(node) else {
            return;
        };
        let (Some(size), count) = (slot.size_attr, slot.nodes.len()) else {
            return;
        };
        let mut buf = itoa::Buffer::new();
        let value = buf.format(count).to_string();
        if let Some(attr) = self.arena.attr_mut(size) {
            attr.value = value;
        }
    }

    fn register_node(&mut self, id: NodeId) {
        let key = self.arena.node_key(id);
        self.node_index.insert(key, id);
    }

    fn register_attr(&mut self, id: AttrId) {
        let key = self.arena.attr_key(id);
        self.attr_index.insert(key, id);
    }

    fn unregister_node(&mut self, id: NodeId) {
        let key = self.arena.node_key(id);
        if self.node_index.get(&key) == Some(&id) {
            self.node_index.remove(&key);
        }
    }

    fn unregister_attr(&mut self, id: AttrId) {
        let key = self.arena.attr_key(id);
        if self.attr_index.get(&key) == Some(&id) {
            self.attr_index.remove(&key);
        }
    }

    fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            order.push(current);
            if let Some(slot) = self.arena.node(current) {
                stack.extend(slot.nodes.iter().rev().copied());
            }
        }
        order
    }

    fn attrs_of(&self, id: NodeId) -> Vec<AttrId> {
        self.arena
            .node(id)
            .map(|slot| slot.attributes.clone())
            .unwrap_or_default()
    }

    fn unregister_subtree(&mut self, id: NodeId) {
        for node in self.subtree(id) {
            for attr in self.attrs_of(node) {
                self.unregister_attr(attr);
            }
            self.unregister_node(node);
        }
    }

    fn register_subtree(&mut self, id: NodeId) {
        for node in self.subtree(id) {
            self.register_node(node);
            for attr in self.attrs_of(node) {
                self.register_attr(attr);
            }
        }
    }

    fn release_subtree(&mut self, id: NodeId) {
        for node in self.subtree(id) {
            for attr in self.attrs_of(node) {
                self.arena.release_attr(attr);
            }
            self.arena.release_node(node);
        }
    }
}

fn element_name(index: usize) -> SmolStr {
    let mut buf = itoa::Buffer::new();
    let digits = buf.format(index);
    let mut name = String::with_capacity(digits.len() + 2);
    name.push('[');
    name.push_str(digits);
    name.push(']');
    SmolStr::from(name)
}
