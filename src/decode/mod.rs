pub mod chars;
pub mod meta;
pub mod parser;
pub mod reader;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use encoding_rs::Encoding;
use tracing::{debug, trace};

use crate::document::Document;
use crate::{Error, LoadOptions, Result};

pub use meta::{MetaNode, MetaState};
pub use parser::{Event, ParseState, Parser};
pub use reader::FlexReader;

pub fn from_str(input: &str) -> Result<Document> {
    let mut doc = Document::new();
    doc.load_str(input)?;
    Ok(doc)
}

pub fn from_slice(input: &[u8], options: &LoadOptions) -> Result<Document> {
    from_reader(input, options)
}

pub fn from_reader<R: Read>(reader: R, options: &LoadOptions) -> Result<Document> {
    let mut doc = Document::new();
    doc.load(reader, options)?;
    Ok(doc)
}

pub fn from_path<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Document> {
    let file = File::open(path.as_ref())?;
    from_reader(file, options)
}

/// Resolves a charset label the way a `locale` attribute spells it.
pub fn lookup_encoding(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| Error::charset(label))
}

/// Streams `source` into `doc`, which must be empty.
///
/// With `follow_header` set, the charset declared by a `!CONFIG` header
/// takes over decoding from the character after the header closes.
pub(crate) fn load_into<R: Read>(
    doc: &mut Document,
    source: R,
    options: &LoadOptions,
    follow_header: bool,
) -> Result<()> {
    let mut locale = options.charset_label();
    let encoding = lookup_encoding(&locale)?;
    let mut reader = FlexReader::with_cache_size(source, encoding, options.effective_cache_size());
    let mut parser = Parser::new(doc.root_id());
    let mut meta = MetaNode::new();
    debug!(
        charset = encoding.name(),
        cache = reader.cache_capacity(),
        "loading document"
    );

    let mut chars = 0usize;
    while let Some(ch) = reader.read_char()? {
        chars += 1;
        let Some(event) = parser.feed(doc, ch)? else {
            continue;
        };
        trace!(?event, "parser event");
        let header = meta
            .observe(doc, event, &locale)
            .map_err(|err| err.with_location(parser.location(doc)))?;
        let Some(header) = header else {
            continue;
        };
        if follow_header {
            let declared = lookup_encoding(&header.locale)
                .map_err(|err| err.with_location(parser.location(doc)))?;
            if declared != reader.encoding() {
                debug!(
                    from = reader.encoding().name(),
                    to = declared.name(),
                    "switching charset"
                );
                reader.set_encoding(declared);
            }
        }
        locale = header.locale.clone();
        doc.set_header(header);
    }
    parser.finish(doc)?;
    doc.set_locale(locale);
    debug!(
        chars,
        nodes = doc.node_key_count(),
        attributes = doc.key_count(),
        "document loaded"
    );
    Ok(())
}
