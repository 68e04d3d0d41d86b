use crate::constants::{ARRAY_SUFFIX, CONFIG_LOCALE_NAME, CONFIG_NODE_NAME, CONFIG_VERSION_NAME};
use crate::text::mask_value_into;
use crate::FormatMode;

const INDENT_UNIT: &str = "\t";

pub(crate) struct Writer {
    buffer: String,
    mode: FormatMode,
    indent_cache: Vec<String>,
}

impl Writer {
    pub fn new(mode: FormatMode) -> Self {
        Self {
            buffer: String::new(),
            mode,
            indent_cache: vec![String::new()],
        }
    }

    pub fn finish(self) -> String {
        self.buffer
    }

    pub fn write_str(&mut self, s: &str) {
        self.buffer.push_str(s);
    }

    pub fn write_char(&mut self, ch: char) {
        self.buffer.push(ch);
    }

    pub fn write_newline(&mut self) {
        self.buffer.push('\n');
    }

    pub fn write_indent(&mut self, depth: usize) {
        if depth == 0 {
            return;
        }
        if depth >= self.indent_cache.len() {
            self.extend_indent_cache(depth);
        }
        self.buffer.push_str(&self.indent_cache[depth]);
    }

    /// `!CONFIG { version="…" locale="…" }` followed by a blank line.
    pub fn write_header(&mut self, version: &str, locale: &str) {
        self.write_str(CONFIG_NODE_NAME);
        self.write_str(" { ");
        self.write_pair(CONFIG_VERSION_NAME, version);
        self.write_char(' ');
        self.write_pair(CONFIG_LOCALE_NAME, locale);
        self.write_str(" }");
        self.write_newline();
        self.write_newline();
    }

    pub fn write_attribute(&mut self, name: &str, value: &str, depth: usize) {
        self.begin_element(depth);
        self.write_pair(name, value);
        self.end_element();
    }

    /// Opens a block. Array elements pass no name.
    pub fn open_node(&mut self, name: Option<&str>, is_array: bool, depth: usize) {
        self.begin_element(depth);
        if let Some(name) = name {
            self.write_str(name);
            if is_array {
                self.write_str(ARRAY_SUFFIX);
            }
            if self.mode != FormatMode::Compact {
                self.write_char(' ');
            }
        }
        self.write_char('{');
        self.end_element();
    }

    pub fn close_node(&mut self, depth: usize) {
        self.begin_element(depth);
        self.write_char('}');
        self.end_element();
    }

    fn write_pair(&mut self, name: &str, value: &str) {
        self.write_str(name);
        self.write_str("=\"");
        mask_value_into(&mut self.buffer, value);
        self.write_char('"');
    }

    fn begin_element(&mut self, depth: usize) {
        match self.mode {
            FormatMode::File => self.write_indent(depth),
            FormatMode::String => {
                if !self.buffer.is_empty() {
                    self.write_char(' ');
                }
            }
            FormatMode::Compact => {}
        }
    }

    fn end_element(&mut self) {
        if self.mode == FormatMode::File {
            self.write_newline();
        }
    }

    fn extend_indent_cache(&mut self, depth: usize) {
        while self.indent_cache.len() <= depth {
            let next = match self.indent_cache.last() {
                Some(prev) => {
                    let mut s = String::with_capacity(prev.len() + INDENT_UNIT.len());
                    s.push_str(prev);
                    s.push_str(INDENT_UNIT);
                    s
                }
                None => String::new(),
            };
            self.indent_cache.push(next);
        }
    }
}
