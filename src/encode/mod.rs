mod writer;

use std::io::Write;

use crate::decode::lookup_encoding;
use crate::document::{Document, NodeRef};
use crate::{FormatMode, Result};

/// Render a document as text.
///
/// `File` mode writes the `!CONFIG` header (when the document has one), a
/// blank line and then one element per line, indented with tabs. `String`
/// mode puts everything on one line separated by single spaces, and
/// `Compact` leaves out every optional whitespace character. Within a
/// node, attributes come first, then subnodes, each in insertion order.
///
/// # Examples
///
/// ```
/// use xconf::{encode, FormatMode};
///
/// let doc = xconf::from_str(r#"server { port="8080" }"#)?;
/// assert_eq!(
///     encode::to_string(&doc, FormatMode::String),
///     r#"server { port="8080" }"#
/// );
/// assert_eq!(
///     encode::to_string(&doc, FormatMode::Compact),
///     r#"server{port="8080"}"#
/// );
/// # Ok::<(), xconf::Error>(())
/// ```
pub fn to_string(doc: &Document, mode: FormatMode) -> String {
    let mut writer = writer::Writer::new(mode);
    if mode == FormatMode::File {
        if let Some(header) = doc.header() {
            writer.write_header(&header.version, &header.locale);
        }
    }
    write_body(&mut writer, doc.root(), 0);
    writer.finish()
}

/// Render and encode a document.
///
/// In `File` mode with a header, the text is encoded with the header's
/// locale; otherwise it is UTF-8.
pub fn to_vec(doc: &Document, mode: FormatMode) -> Result<Vec<u8>> {
    let text = to_string(doc, mode);
    match doc.header() {
        Some(header) if mode == FormatMode::File => {
            let encoding = lookup_encoding(&header.locale)?;
            let (bytes, _, _) = encoding.encode(&text);
            Ok(bytes.into_owned())
        }
        _ => Ok(text.into_bytes()),
    }
}

pub fn to_writer<W: Write>(mut writer: W, doc: &Document, mode: FormatMode) -> Result<()> {
    let bytes = to_vec(doc, mode)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

fn write_body(writer: &mut writer::Writer, node: NodeRef<'_>, depth: usize) {
    let in_array = node.is_array();
    if !in_array {
        for attr in node.attributes() {
            writer.write_attribute(attr.name(), attr.value(), depth);
        }
    }
    for child in node.nodes() {
        let name = if in_array { None } else { Some(child.name()) };
        writer.open_node(name, child.is_array(), depth);
        write_body(writer, child, depth + 1);
        writer.close_node(depth);
    }
}
