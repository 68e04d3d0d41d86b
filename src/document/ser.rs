use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::document::{Document, NodeRef};

/// Nodes become maps (attributes first, then subnodes), arrays become
/// sequences of their elements, values stay strings. An array's `size` is
/// implied by the sequence length and not emitted.
impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.root().serialize(serializer)
    }
}

impl Serialize for NodeRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_array() {
            let mut seq = serializer.serialize_seq(Some(self.node_count()))?;
            for element in self.nodes() {
                seq.serialize_element(&element)?;
            }
            return seq.end();
        }

        let mut map =
            serializer.serialize_map(Some(self.attribute_count() + self.node_count()))?;
        for attr in self.attributes() {
            map.serialize_entry(attr.name(), attr.value())?;
        }
        for node in self.nodes() {
            map.serialize_entry(node.name(), &node)?;
        }
        map.end()
    }
}
