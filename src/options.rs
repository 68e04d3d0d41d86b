use crate::constants::{DEFAULT_CACHE_SIZE, DEFAULT_LOCALE, MIN_CACHE_SIZE};

/// Layout used when rendering a document back to text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatMode {
    /// One element per line, tab indentation, `!CONFIG` header when known.
    #[default]
    File,
    /// Everything on a single line, tokens separated by one space.
    String,
    /// Single line without any whitespace.
    Compact,
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub charset: Option<String>,
    pub cache_size: usize,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.cache_size = cache_size;
        self
    }

    /// Charset label to start decoding with, upper-cased.
    pub fn charset_label(&self) -> String {
        match self.charset.as_deref().map(str::trim) {
            Some(label) if !label.is_empty() => label.to_ascii_uppercase(),
            _ => DEFAULT_LOCALE.to_string(),
        }
    }

    /// Cache capacity after applying the default and the lower bound.
    pub fn effective_cache_size(&self) -> usize {
        match self.cache_size {
            0 => DEFAULT_CACHE_SIZE,
            size => size.max(MIN_CACHE_SIZE),
        }
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            charset: None,
            cache_size: DEFAULT_CACHE_SIZE,
        }
    }
}
