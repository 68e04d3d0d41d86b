pub(crate) mod arena;
pub mod constants;
pub mod decode;
pub mod document;
pub mod encode;
pub mod error;
pub mod lookup;
pub mod options;
pub mod text;

use std::io::{Read, Write};
use std::path::Path;

pub use crate::arena::{AttrId, NodeId};
pub use crate::document::{AttrRef, ConfigHeader, Document, NodeRef};
pub use crate::error::{Error, ErrorKind, Location};
pub use crate::lookup::Lookup;
pub use crate::options::{FormatMode, LoadOptions};

pub type Result<T> = std::result::Result<T, Error>;

/// Parse a document from text.
///
/// ```
/// use xconf::Lookup;
///
/// let doc = xconf::from_str(r#"
///     // connection settings
///     db { host="localhost" port="5432" }
///     replicas[] { { host="r1" } { host="r2" } }
/// "#)?;
/// assert_eq!(doc.get_int_key("db.port")?, 5432);
/// assert_eq!(doc.get_key("replicas[1].host")?, "r2");
/// assert_eq!(doc.get_key("replicas[].size")?, "2");
/// # Ok::<(), xconf::Error>(())
/// ```
pub fn from_str(input: &str) -> Result<Document> {
    decode::from_str(input)
}

pub fn from_slice(input: &[u8]) -> Result<Document> {
    from_slice_with_options(input, &LoadOptions::default())
}

pub fn from_slice_with_options(input: &[u8], options: &LoadOptions) -> Result<Document> {
    decode::from_slice(input, options)
}

pub fn from_reader<R: Read>(reader: R) -> Result<Document> {
    from_reader_with_options(reader, &LoadOptions::default())
}

pub fn from_reader_with_options<R: Read>(reader: R, options: &LoadOptions) -> Result<Document> {
    decode::from_reader(reader, options)
}

pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Document> {
    from_path_with_options(path, &LoadOptions::default())
}

pub fn from_path_with_options<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Document> {
    decode::from_path(path, options)
}

pub fn to_string(doc: &Document) -> String {
    to_string_with_mode(doc, FormatMode::default())
}

pub fn to_string_with_mode(doc: &Document, mode: FormatMode) -> String {
    encode::to_string(doc, mode)
}

pub fn to_vec(doc: &Document) -> Result<Vec<u8>> {
    to_vec_with_mode(doc, FormatMode::default())
}

pub fn to_vec_with_mode(doc: &Document, mode: FormatMode) -> Result<Vec<u8>> {
    encode::to_vec(doc, mode)
}

pub fn to_writer<W: Write>(writer: W, doc: &Document) -> Result<()> {
    to_writer_with_mode(writer, doc, FormatMode::default())
}

pub fn to_writer_with_mode<W: Write>(writer: W, doc: &Document, mode: FormatMode) -> Result<()> {
    encode::to_writer(writer, doc, mode)
}
