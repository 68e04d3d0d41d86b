//! `!CONFIG` meta-node protocol.
//!
//! The meta-node may only appear as the very first element of the root
//! body, carries nothing but `version` and `locale`, and is detached from
//! the tree as soon as it closes. Any other node named `!CONFIG` is an error.

use crate::arena::{join_key, NodeId};
use crate::constants::{
    is_config_attr_name, CONFIG_LOCALE_NAME, CONFIG_NODE_NAME, CONFIG_VERSION_NAME,
};
use crate::decode::parser::Event;
use crate::document::{ConfigHeader, Document};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaState {
    NotOpened,
    Opened,
    Finished,
}

#[derive(Debug)]
pub struct MetaNode {
    state: MetaState,
    node: Option<NodeId>,
}

impl Default for MetaNode {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaNode {
    pub fn new() -> Self {
        Self {
            state: MetaState::NotOpened,
            node: None,
        }
    }

    pub fn state(&self) -> MetaState {
        self.state
    }

    /// Checks one parser event against the protocol.
    ///
    /// A `!CONFIG` node anywhere but as the first root element is an error,
    /// also after a valid header. Returns the header when the meta-node
    /// closes; `default_locale` fills in a missing `locale` attribute.
    pub fn observe(
        &mut self,
        doc: &mut Document,
        event: Event,
        default_locale: &str,
    ) -> Result<Option<ConfigHeader>> {
        match self.state {
            MetaState::Finished => match event {
                Event::NodeCreated(node) if is_config_node(doc, node) => {
                    Err(misplaced(doc, node))
                }
                _ => Ok(None),
            },
            MetaState::NotOpened => {
                if let Event::NodeCreated(node) = event {
                    self.open(doc, node)?;
                }
                Ok(None)
            }
            MetaState::Opened => match event {
                Event::NodeCreated(_) => {
                    Err(Error::config("config node can not include subnodes"))
                }
                Event::AttrCreated(attr) => {
                    let name = doc.attr_name(attr).unwrap_or_default();
                    if is_config_attr_name(name) {
                        Ok(None)
                    } else {
                        Err(Error::config(format!(
                            "config node can not have attribute '{name}'"
                        )))
                    }
                }
                Event::NodeClosed(node) if Some(node) == self.node => {
                    self.close(doc, node, default_locale).map(Some)
                }
                Event::NodeClosed(_) => Ok(None),
            },
        }
    }

    fn open(&mut self, doc: &Document, node: NodeId) -> Result<()> {
        if !is_config_node(doc, node) {
            return Ok(());
        }
        if doc.parent_of(node) != Some(doc.root_id()) {
            return Err(misplaced(doc, node));
        }
        let root = doc.root();
        if root.node_count() != 1 || root.attribute_count() != 0 {
            return Err(misplaced(doc, node));
        }
        if doc.is_array_node(node) {
            return Err(Error::config("config node can not be an array"));
        }
        self.state = MetaState::Opened;
        self.node = Some(node);
        Ok(())
    }

    fn close(
        &mut self,
        doc: &mut Document,
        node: NodeId,
        default_locale: &str,
    ) -> Result<ConfigHeader> {
        let key = doc.node_key(node);
        let version = doc
            .attr(&join_key(&key, CONFIG_VERSION_NAME))
            .map(|attr| attr.value().to_string())
            .ok_or_else(|| Error::config("config node must have a version attribute"))?;
        let locale = doc
            .attr(&join_key(&key, CONFIG_LOCALE_NAME))
            .map(|attr| attr.value().trim().to_uppercase())
            .filter(|locale| !locale.is_empty())
            .unwrap_or_else(|| default_locale.to_string());
        doc.remove_node(node)?;
        self.state = MetaState::Finished;
        self.node = None;
        Ok(ConfigHeader { version, locale })
    }
}

fn is_config_node(doc: &Document, node: NodeId) -> bool {
    doc.node_name(node) == Some(CONFIG_NODE_NAME)
}

fn misplaced(doc: &Document, node: NodeId) -> Error {
    if doc.parent_of(node) == Some(doc.root_id()) {
        Error::config("config node is not the first element")
    } else {
        Error::config("config node is not in the root node")
    }
}
