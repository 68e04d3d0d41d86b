use std::fmt;
use std::io;

use crate::decode::ParseState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A character with no valid transition in the current parser state.
    Syntax,
    /// Misplaced or malformed `!CONFIG` meta-node.
    Config,
    KeyNotFound,
    /// A value that can not be converted to the requested type.
    WrongValue,
    Charset,
    /// An operation the document tree does not allow.
    Tree,
    Io,
}

/// Where in the input a load error happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
    /// Text of the current line up to and including the offending character.
    pub line_text: String,
    pub state: ParseState,
    /// ID of the node whose body was open.
    pub node: String,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}, column {}, state {}, node '{}'",
            self.line, self.column, self.state, self.node
        )
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{message}{}", location_suffix(.location))]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub location: Option<Box<Location>>,
    #[source]
    source: Option<io::Error>,
}

fn location_suffix(location: &Option<Box<Location>>) -> String {
    match location {
        Some(location) => format!(" ({location})"),
        None => String::new(),
    }
}

impl Error {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: None,
            source: None,
        }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn key_not_found(key: &str) -> Self {
        Self::new(ErrorKind::KeyNotFound, format!("key [{key}] not found"))
    }

    pub fn wrong_value(key: &str, expected: &str, value: &str) -> Self {
        let message = if value.is_empty() {
            format!("value of [{key}] is not {expected}: empty value")
        } else {
            format!("value of [{key}] is not {expected}: wrong value [{value}]")
        };
        Self::new(ErrorKind::WrongValue, message)
    }

    pub fn charset(label: &str) -> Self {
        Self::new(ErrorKind::Charset, format!("unsupported charset [{label}]"))
    }

    pub fn tree(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Tree, message)
    }

    pub fn io(err: io::Error) -> Self {
        Self {
            kind: ErrorKind::Io,
            message: format!("i/o failure: {err}"),
            location: None,
            source: Some(err),
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(Box::new(location));
        self
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::KeyNotFound
    }

    /// Multi-line report pointing at the offending column.
    pub fn diagnostic(&self) -> String {
        let title = match self.kind {
            ErrorKind::Syntax => "PARSE ERROR",
            ErrorKind::Config => "CONFIG ERROR",
            ErrorKind::Charset => "CHARSET ERROR",
            ErrorKind::Io => "IO ERROR",
            ErrorKind::KeyNotFound | ErrorKind::WrongValue | ErrorKind::Tree => "ERROR",
        };
        let Some(location) = self.location.as_deref() else {
            return format!("{title}: {}", self.message);
        };
        let caret = " ".repeat(location.column.saturating_sub(1));
        format!(
            "{title}: {}\n - INFO: Line={} Pos={} State={} Node='{}'\n - TEXT: {}\n         {caret}^",
            self.message,
            location.line,
            location.column,
            location.state,
            location.node,
            location.line_text,
        )
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::io(err)
    }
}
