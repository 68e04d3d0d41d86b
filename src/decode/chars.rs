//! Character classes used by the grammar parser.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Space,
    LineEnd,
    Name,
    OpenBlock,
    CloseBlock,
    Equal,
    Quote,
    Slash,
    Star,
    Other,
}

/// Letters, digits, `_`, `-`, `!` and the array brackets.
#[inline]
pub fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '!' | '[' | ']')
}

/// Separator within a line.
#[inline]
pub fn is_space(ch: char) -> bool {
    ch == ' ' || ch == '\t'
}

#[inline]
pub fn is_line_end(ch: char) -> bool {
    ch == '\r' || ch == '\n'
}

#[inline]
pub fn is_backslash(ch: char) -> bool {
    ch == '\\'
}

#[inline]
pub fn is_open_block(ch: char) -> bool {
    ch == '{'
}

#[inline]
pub fn is_close_block(ch: char) -> bool {
    ch == '}'
}

#[inline]
pub fn is_equal(ch: char) -> bool {
    ch == '='
}

#[inline]
pub fn is_quote(ch: char) -> bool {
    ch == '"'
}

#[inline]
pub fn is_slash(ch: char) -> bool {
    ch == '/'
}

#[inline]
pub fn is_star(ch: char) -> bool {
    ch == '*'
}

pub fn classify(ch: char) -> CharClass {
    if is_space(ch) {
        CharClass::Space
    } else if is_line_end(ch) {
        CharClass::LineEnd
    } else if is_name_char(ch) {
        CharClass::Name
    } else if is_open_block(ch) {
        CharClass::OpenBlock
    } else if is_close_block(ch) {
        CharClass::CloseBlock
    } else if is_equal(ch) {
        CharClass::Equal
    } else if is_quote(ch) {
        CharClass::Quote
    } else if is_slash(ch) {
        CharClass::Slash
    } else if is_star(ch) {
        CharClass::Star
    } else {
        CharClass::Other
    }
}
