use std::fmt;

use crate::arena::{AttrId, NodeId};
use crate::decode::chars::{classify, is_backslash, is_line_end, CharClass};
use crate::document::Document;
use crate::error::Location;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// Between elements; the initial state.
    WaitName,
    Name,
    /// After a name: `=` starts an attribute, `{` a node.
    WaitEqualOrOpenBlock,
    WaitOpenQuote,
    Value,
    /// After an array name, or inside an array body.
    WaitOpenBlock,
    /// Saw `/` at an element boundary.
    Comment,
    LineComment,
    BlockComment,
}

impl ParseState {
    pub fn name(self) -> &'static str {
        match self {
            ParseState::WaitName => "WAITNAME",
            ParseState::Name => "NAME",
            ParseState::WaitEqualOrOpenBlock => "WAITEQUALOROPENBLOCK",
            ParseState::WaitOpenQuote => "WAITOPENQUOTE",
            ParseState::Value => "VALUE",
            ParseState::WaitOpenBlock => "WAITOPENBLOCK",
            ParseState::Comment => "COMMENT",
            ParseState::LineComment => "LINECOMMENT",
            ParseState::BlockComment => "BLOCKCOMMENT",
        }
    }
}

impl fmt::Display for ParseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Structural change made to the document by one character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    NodeCreated(NodeId),
    NodeClosed(NodeId),
    AttrCreated(AttrId),
}

/// What the parser does with one classified character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Stay,
    StartName,
    PushName,
    /// The name is complete; the character is handled again in
    /// `WAITEQUALOROPENBLOCK`.
    EndName,
    ExpectQuote,
    OpenBlock,
    OpenValue,
    Quote,
    PushValue,
    CloseBlock,
    EnterComment,
    StartLineComment,
    StartBlockComment,
    CommentStar,
    CommentSlash,
    CommentChar,
    LeaveComment,
    Fail(&'static str),
}

/// Transition table of the grammar. `in_array` tells whether the body being
/// parsed belongs to an array node.
pub fn transition(state: ParseState, class: CharClass, in_array: bool) -> Action {
    use CharClass as C;
    use ParseState as S;

    let element_state = matches!(
        state,
        S::WaitName | S::Name | S::WaitEqualOrOpenBlock | S::WaitOpenQuote | S::Value
    );
    if in_array && element_state {
        return Action::Fail("wrong state for array node");
    }

    match (state, class) {
        (S::WaitName, C::Space | C::LineEnd) => Action::Stay,
        (S::WaitName, C::Name) => Action::StartName,
        (S::WaitName, C::CloseBlock) => Action::CloseBlock,
        (S::WaitName, C::Slash) => Action::EnterComment,
        (S::WaitName, _) => Action::Fail("wrong symbol"),

        (S::Name, C::Name) => Action::PushName,
        (S::Name, _) => Action::EndName,

        (S::WaitEqualOrOpenBlock, C::Space | C::LineEnd) => Action::Stay,
        (S::WaitEqualOrOpenBlock, C::Equal) => Action::ExpectQuote,
        (S::WaitEqualOrOpenBlock, C::OpenBlock) => Action::OpenBlock,
        (S::WaitEqualOrOpenBlock, C::Slash) => Action::EnterComment,
        (S::WaitEqualOrOpenBlock, _) => Action::Fail("wrong symbol, expected '=' or '{'"),

        (S::WaitOpenQuote, C::Space | C::LineEnd) => Action::Stay,
        (S::WaitOpenQuote, C::Quote) => Action::OpenValue,
        (S::WaitOpenQuote, C::Slash) => Action::EnterComment,
        (S::WaitOpenQuote, _) => Action::Fail("wrong symbol, expected open quote"),

        (S::Value, C::Quote) => Action::Quote,
        (S::Value, C::LineEnd) => Action::Fail("missing end quote"),
        (S::Value, _) => Action::PushValue,

        (S::WaitOpenBlock, C::Space | C::LineEnd) => Action::Stay,
        (S::WaitOpenBlock, C::OpenBlock) => Action::OpenBlock,
        (S::WaitOpenBlock, C::CloseBlock) if in_array => Action::CloseBlock,
        (S::WaitOpenBlock, C::Slash) => Action::EnterComment,
        (S::WaitOpenBlock, C::Name) if in_array => {
            Action::Fail("array body may only contain anonymous blocks")
        }
        (S::WaitOpenBlock, _) => Action::Fail("wrong symbol, expected '{'"),

        (S::Comment, C::Slash) => Action::StartLineComment,
        (S::Comment, C::Star) => Action::StartBlockComment,
        (S::Comment, _) => Action::Fail("wrong symbol, expected '/' or '*' to start a comment"),

        (S::LineComment, C::LineEnd) => Action::LeaveComment,
        (S::LineComment, _) => Action::Stay,

        (S::BlockComment, C::Star) => Action::CommentStar,
        (S::BlockComment, C::Slash) => Action::CommentSlash,
        (S::BlockComment, _) => Action::CommentChar,
    }
}

/// Character-at-a-time grammar parser building into a [`Document`].
#[derive(Debug)]
pub struct Parser {
    state: ParseState,
    /// State to return to when the current comment ends.
    resume: ParseState,
    current: NodeId,
    name: String,
    value: String,
    prev: char,
    star: bool,
    line: usize,
    column: usize,
    line_text: String,
    last: Option<char>,
}

impl Parser {
    pub fn new(root: NodeId) -> Self {
        Self {
            state: ParseState::WaitName,
            resume: ParseState::WaitName,
            current: root,
            name: String::new(),
            value: String::new(),
            prev: '\0',
            star: false,
            line: 1,
            column: 1,
            line_text: String::new(),
            last: None,
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Node whose body is being parsed.
    pub fn current(&self) -> NodeId {
        self.current
    }

    /// Position of the most recently fed character.
    pub fn location(&self, doc: &Document) -> Location {
        Location {
            line: self.line,
            column: self.column,
            line_text: self.line_text.clone(),
            state: self.state,
            node: doc.node_key(self.current),
        }
    }

    pub fn feed(&mut self, doc: &mut Document, ch: char) -> Result<Option<Event>> {
        self.track(ch);
        self.step(doc, ch)
    }

    /// Ends the input. A virtual line feed terminates a trailing line
    /// comment; anything still open afterwards is an error.
    pub fn finish(&mut self, doc: &mut Document) -> Result<()> {
        self.feed(doc, '\n')?;
        if self.state == ParseState::BlockComment {
            return Err(self.fail(doc, "unterminated block comment"));
        }
        if self.current != doc.root_id() {
            return Err(self.fail(doc, "unexpected end of input, block is not closed"));
        }
        if self.state != ParseState::WaitName {
            return Err(self.fail(doc, "unexpected end of input"));
        }
        Ok(())
    }

    fn track(&mut self, ch: char) {
        if let Some(last) = self.last {
            if last == '\n' {
                self.line += 1;
                self.column = 1;
                self.line_text.clear();
            } else if !is_line_end(last) {
                self.column += 1;
            }
        }
        if !is_line_end(ch) {
            self.line_text.push(ch);
        }
        self.prev = self.last.unwrap_or('\0');
        self.last = Some(ch);
    }

    fn step(&mut self, doc: &mut Document, ch: char) -> Result<Option<Event>> {
        let in_array = doc.is_array_node(self.current);
        match transition(self.state, classify(ch), in_array) {
            Action::Stay => {}
            Action::StartName => {
                if ch == '[' || ch == ']' {
                    return Err(self.fail(doc, "array name must have at least one symbol"));
                }
                self.name.clear();
                self.name.push(ch);
                self.state = ParseState::Name;
            }
            Action::PushName => {
                if self.name.ends_with('[') && ch != ']' {
                    return Err(self.fail(doc, "'[' in a name must be followed by ']'"));
                }
                if ch == ']' && !self.name.ends_with('[') {
                    return Err(self.fail(doc, "array name must end with '[]'"));
                }
                self.name.push(ch);
                if ch == ']' {
                    self.state = ParseState::WaitOpenBlock;
                }
            }
            Action::EndName => {
                if self.name.ends_with('[') {
                    return Err(self.fail(doc, "'[' in a name must be followed by ']'"));
                }
                self.state = ParseState::WaitEqualOrOpenBlock;
                return self.step(doc, ch);
            }
            Action::ExpectQuote => self.state = ParseState::WaitOpenQuote,
            Action::OpenBlock => {
                let name = std::mem::take(&mut self.name);
                let node = doc
                    .append_node(self.current, &name)
                    .map_err(|err| self.relocate(doc, err))?;
                self.current = node;
                self.state = self.body_state(doc);
                return Ok(Some(Event::NodeCreated(node)));
            }
            Action::OpenValue => {
                self.value.clear();
                self.state = ParseState::Value;
            }
            Action::Quote => {
                if is_backslash(self.prev) {
                    self.value.pop();
                    self.value.push(ch);
                    return Ok(None);
                }
                let name = std::mem::take(&mut self.name);
                let value = std::mem::take(&mut self.value);
                let attr = doc
                    .create_attribute(self.current, &name, value)
                    .map_err(|err| self.relocate(doc, err))?;
                self.state = ParseState::WaitName;
                return Ok(Some(Event::AttrCreated(attr)));
            }
            Action::PushValue => self.value.push(ch),
            Action::CloseBlock => {
                let Some(parent) = doc.parent_of(self.current) else {
                    return Err(self.fail(doc, "unexpected '}' outside of any block"));
                };
                let closed = self.current;
                self.current = parent;
                self.state = self.body_state(doc);
                return Ok(Some(Event::NodeClosed(closed)));
            }
            Action::EnterComment => {
                self.resume = self.state;
                self.state = ParseState::Comment;
            }
            Action::StartLineComment => self.state = ParseState::LineComment,
            Action::StartBlockComment => {
                self.star = false;
                self.state = ParseState::BlockComment;
            }
            Action::CommentStar => self.star = true,
            Action::CommentSlash => {
                if self.star {
                    self.state = self.resume;
                }
                self.star = false;
            }
            Action::CommentChar => self.star = false,
            Action::LeaveComment => self.state = self.resume,
            Action::Fail(message) => return Err(self.fail(doc, message)),
        }
        Ok(None)
    }

    fn body_state(&self, doc: &Document) -> ParseState {
        if doc.is_array_node(self.current) {
            ParseState::WaitOpenBlock
        } else {
            ParseState::WaitName
        }
    }

    fn fail(&self, doc: &Document, message: &str) -> Error {
        Error::syntax(message).with_location(self.location(doc))
    }

    fn relocate(&self, doc: &Document, err: Error) -> Error {
        Error::syntax(err.message).with_location(self.location(doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use rstest::rstest;

    fn parse(input: &str) -> Result<Document> {
        let mut doc = Document::new();
        let mut parser = Parser::new(doc.root_id());
        for ch in input.chars() {
            parser.feed(&mut doc, ch)?;
        }
        parser.finish(&mut doc)?;
        Ok(doc)
    }

    fn events(input: &str) -> Vec<Event> {
        let mut doc = Document::new();
        let mut parser = Parser::new(doc.root_id());
        input
            .chars()
            .filter_map(|ch| parser.feed(&mut doc, ch).expect("parse"))
            .collect()
    }

    #[rstest]
    #[case(ParseState::WaitName, CharClass::Space, false, Action::Stay)]
    #[case(ParseState::WaitName, CharClass::Name, false, Action::StartName)]
    #[case(ParseState::WaitName, CharClass::CloseBlock, false, Action::CloseBlock)]
    #[case(ParseState::WaitName, CharClass::Slash, false, Action::EnterComment)]
    #[case(ParseState::Name, CharClass::Equal, false, Action::EndName)]
    #[case(ParseState::WaitEqualOrOpenBlock, CharClass::Equal, false, Action::ExpectQuote)]
    #[case(ParseState::WaitEqualOrOpenBlock, CharClass::OpenBlock, false, Action::OpenBlock)]
    #[case(ParseState::WaitOpenQuote, CharClass::Quote, false, Action::OpenValue)]
    #[case(ParseState::Value, CharClass::Quote, false, Action::Quote)]
    #[case(ParseState::Value, CharClass::Slash, false, Action::PushValue)]
    #[case(ParseState::WaitOpenBlock, CharClass::OpenBlock, true, Action::OpenBlock)]
    #[case(ParseState::WaitOpenBlock, CharClass::CloseBlock, true, Action::CloseBlock)]
    #[case(ParseState::LineComment, CharClass::LineEnd, false, Action::LeaveComment)]
    #[case(ParseState::LineComment, CharClass::Quote, true, Action::Stay)]
    #[case(ParseState::BlockComment, CharClass::Star, false, Action::CommentStar)]
    #[case(ParseState::BlockComment, CharClass::LineEnd, false, Action::CommentChar)]
    fn test_transition(
        #[case] state: ParseState,
        #[case] class: CharClass,
        #[case] in_array: bool,
        #[case] expected: Action,
    ) {
        assert_eq!(transition(state, class, in_array), expected);
    }

    #[rstest]
    #[case(ParseState::WaitName, CharClass::Equal, false)]
    #[case(ParseState::WaitName, CharClass::Name, true)]
    #[case(ParseState::Value, CharClass::LineEnd, false)]
    #[case(ParseState::WaitOpenBlock, CharClass::CloseBlock, false)]
    #[case(ParseState::WaitOpenBlock, CharClass::Name, true)]
    #[case(ParseState::Comment, CharClass::Name, false)]
    fn test_transition_failures(
        #[case] state: ParseState,
        #[case] class: CharClass,
        #[case] in_array: bool,
    ) {
        assert!(matches!(transition(state, class, in_array), Action::Fail(_)));
    }

    #[rstest]
    fn test_events_for_node_and_attribute() {
        let seen = events("n { a=\"1\" }");
        assert_eq!(seen.len(), 3);
        assert!(matches!(seen[0], Event::NodeCreated(_)));
        assert!(matches!(seen[1], Event::AttrCreated(_)));
        assert!(matches!(seen[2], Event::NodeClosed(_)));
    }

    #[rstest]
    fn test_events_for_array() {
        let seen = events("arr[] { {} {} }");
        let created = seen
            .iter()
            .filter(|event| matches!(event, Event::NodeCreated(_)))
            .count();
        let closed = seen
            .iter()
            .filter(|event| matches!(event, Event::NodeClosed(_)))
            .count();
        assert_eq!(created, 3);
        assert_eq!(closed, 3);
    }

    #[rstest]
    fn test_state_after_array_name() {
        let mut doc = Document::new();
        let mut parser = Parser::new(doc.root_id());
        for ch in "list[]".chars() {
            parser.feed(&mut doc, ch).expect("parse");
        }
        assert_eq!(parser.state(), ParseState::WaitOpenBlock);
        parser.feed(&mut doc, '{').expect("parse");
        assert_eq!(parser.state(), ParseState::WaitOpenBlock);
        assert!(doc.is_array_node(parser.current()));
    }

    #[rstest]
    fn test_escaped_quote_is_rewritten() {
        let doc = parse(r#"a="x\"y""#).expect("parse");
        assert_eq!(doc.attr("a").map(|attr| attr.value()), Some("x\"y"));
    }

    #[rstest]
    fn test_backslash_elsewhere_is_literal() {
        let doc = parse(r#"path="C:\dir\file""#).expect("parse");
        assert_eq!(doc.attr("path").map(|attr| attr.value()), Some(r"C:\dir\file"));
    }

    #[rstest]
    fn test_block_comment_star_slash_needs_fresh_star() {
        let doc = parse("/*/ still comment */ a=\"1\"").expect("parse");
        assert_eq!(doc.attr("a").map(|attr| attr.value()), Some("1"));
    }

    #[rstest]
    #[case("a=\"1", "missing end quote")]
    #[case("n {", "unexpected end of input, block is not closed")]
    #[case("/* open", "unterminated block comment")]
    #[case("dangling", "unexpected end of input")]
    #[case("}", "unexpected '}' outside of any block")]
    #[case("[]{}", "array name must have at least one symbol")]
    #[case("a]{}", "array name must end with '[]'")]
    #[case("a[b=\"1\"", "'[' in a name must be followed by ']'")]
    #[case("a[=\"1\"", "'[' in a name must be followed by ']'")]
    #[case("arr[] { x=\"1\" }", "array body may only contain anonymous blocks")]
    fn test_syntax_errors(#[case] input: &str, #[case] message: &str) {
        let err = parse(input).expect_err("must fail");
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert_eq!(err.message, message);
    }

    #[rstest]
    fn test_error_location() {
        let err = parse("a=\"1\"\nnode {\n  b = x\n}").expect_err("must fail");
        let location = err.location.expect("location");
        assert_eq!(location.line, 3);
        assert_eq!(location.column, 7);
        assert_eq!(location.line_text, "  b = x");
        assert_eq!(location.state, ParseState::WaitOpenQuote);
        assert_eq!(location.node, "node");
    }

    #[rstest]
    fn test_carriage_return_does_not_advance_line() {
        let err = parse("a=\"1\"\r\nb=?").expect_err("must fail");
        let location = err.location.expect("location");
        assert_eq!(location.line, 2);
        assert_eq!(location.column, 3);
    }
}
