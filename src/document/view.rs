use std::borrow::Cow;
use std::fmt;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};

use crate::arena::{join_key, AttrId, AttrSlot, NodeId, NodeSlot};
use crate::constants::ARRAY_SUFFIX;
use crate::document::Document;
use crate::lookup::{self, Lookup};
use crate::text::mask_value;
use crate::Result;

/// Borrowed view of one node.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    doc: &'a Document,
    id: NodeId,
    slot: &'a NodeSlot,
}

impl<'a> NodeRef<'a> {
    pub(crate) fn new(doc: &'a Document, id: NodeId, slot: &'a NodeSlot) -> Self {
        Self { doc, id, slot }
    }

    pub fn node_id(&self) -> NodeId {
        self.id
    }

    /// Name without the `[]` suffix; `[i]` for array elements, empty for
    /// the root.
    pub fn name(&self) -> &'a str {
        &self.slot.name
    }

    /// Index ID: the child node path, plus `[]` for arrays.
    pub fn id(&self) -> String {
        self.doc.node_key(self.id)
    }

    /// Child node path of the parent.
    pub fn path(&self) -> String {
        match self.slot.parent {
            Some(parent) => self.doc.child_node_path(parent),
            None => String::new(),
        }
    }

    pub fn child_node_path(&self) -> String {
        self.doc.child_node_path(self.id)
    }

    pub fn is_array(&self) -> bool {
        self.slot.is_array
    }

    pub fn is_root(&self) -> bool {
        self.slot.parent.is_none()
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.doc.node_by_id(self.slot.parent?)
    }

    /// Attributes in insertion order, including an array's `size`.
    pub fn attributes(&self) -> impl Iterator<Item = AttrRef<'a>> + 'a {
        let (doc, slot) = (self.doc, self.slot);
        slot.attributes
            .iter()
            .filter_map(move |id| doc.attr_by_id(*id))
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let (doc, slot) = (self.doc, self.slot);
        slot.nodes
            .iter()
            .filter_map(move |id| doc.node_by_id(*id))
    }

    pub fn attribute_count(&self) -> usize {
        self.slot.attributes.len()
    }

    pub fn node_count(&self) -> usize {
        self.slot.nodes.len()
    }

    /// First attribute called `name`.
    pub fn find_attr(&self, name: &str) -> Option<AttrRef<'a>> {
        self.attributes().find(|attr| attr.name() == name)
    }

    /// First direct child called `name`; array children match with or
    /// without the `[]` suffix.
    pub fn find_node(&self, name: &str) -> Option<NodeRef<'a>> {
        let (base, want_array) = match name.strip_suffix(ARRAY_SUFFIX) {
            Some(base) => (base, true),
            None => (name, false),
        };
        self.nodes()
            .find(|node| node.name() == base && (!want_array || node.is_array()))
    }

    /// Node addressed relative to this one, e.g. `inner` or `list[2]`.
    pub fn node(&self, child: &str) -> Option<NodeRef<'a>> {
        let prefix = self.child_node_path();
        let key = if self.is_array() || prefix.is_empty() {
            let mut key = prefix;
            key.push_str(child);
            key
        } else {
            join_key(&prefix, child)
        };
        self.doc.node(&key)
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id())
            .field("is_array", &self.is_array())
            .field("attributes", &self.attribute_count())
            .field("nodes", &self.node_count())
            .finish()
    }
}

impl Lookup for NodeRef<'_> {
    fn resolve_key<'k>(&self, key: &'k str) -> Cow<'k, str> {
        if self.is_root() {
            Cow::Borrowed(key)
        } else {
            Cow::Owned(join_key(&self.id(), key))
        }
    }

    fn lookup(&self, key: &str) -> Option<&str> {
        self.doc.attr_value_by_key(&self.resolve_key(key))
    }
}

/// Borrowed view of one attribute.
#[derive(Clone, Copy)]
pub struct AttrRef<'a> {
    doc: &'a Document,
    id: AttrId,
    slot: &'a AttrSlot,
}

impl<'a> AttrRef<'a> {
    pub(crate) fn new(doc: &'a Document, id: AttrId, slot: &'a AttrSlot) -> Self {
        Self { doc, id, slot }
    }

    pub fn attr_id(&self) -> AttrId {
        self.id
    }

    pub fn name(&self) -> &'a str {
        &self.slot.name
    }

    pub fn value(&self) -> &'a str {
        &self.slot.value
    }

    /// Value with every `"` escaped, as written by the serializer.
    pub fn masked_value(&self) -> Cow<'a, str> {
        mask_value(&self.slot.value)
    }

    pub fn id(&self) -> String {
        self.doc.attr_key(self.id)
    }

    /// ID of the owning node.
    pub fn path(&self) -> String {
        self.doc.node_key(self.slot.parent)
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.doc.node_by_id(self.slot.parent)
    }

    pub fn as_int(&self) -> Result<i64> {
        lookup::parse_int(&self.id(), self.value())
    }

    pub fn as_decimal(&self) -> Result<BigDecimal> {
        lookup::parse_decimal(&self.id(), self.value())
    }

    pub fn as_date(&self, format: &str) -> Result<NaiveDate> {
        lookup::parse_date(&self.id(), self.value(), format)
    }

    pub fn as_datetime(&self, format: &str) -> Result<NaiveDateTime> {
        lookup::parse_datetime(&self.id(), self.value(), format)
    }
}

impl fmt::Debug for AttrRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttrRef")
            .field("id", &self.id())
            .field("value", &self.value())
            .finish()
    }
}
