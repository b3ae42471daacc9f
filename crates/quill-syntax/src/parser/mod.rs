//! # Parser - Event-Based Tree Construction
//!
//! Transforms the token stream into a syntax tree using the event-based
//! architecture from rust-analyzer. Grammar functions push [`Event`]s; the
//! [`Sink`] turns them into a Rowan green tree afterwards.
//!
//! ## The Marker System
//!
//! `parser.start()` reserves a slot in the event list and returns a
//! [`Marker`]. The marker **must** be either completed with a node kind or
//! abandoned; dropping it otherwise panics, which catches grammar bugs before
//! they turn into corrupt trees.
//!
//! ```ignore
//! let m = p.start();
//! p.bump(); // `@`
//! p.bump(); // `{`
//! m.complete(p, SyntaxKind::CODE_BLOCK);
//! ```
//!
//! ## Construct Extents
//!
//! Tokens carry the mode depth assigned by the lexer. Grammar rules use
//! [`Parser::depth`] to decide where a construct ends instead of repeating
//! the lexer's mode decisions.
//!
//! ## Public API
//!
//! ```
//! use quill_syntax::parse;
//!
//! let parse = parse("<p>@name</p>");
//! assert!(parse.errors().is_empty());
//! assert_eq!(parse.syntax_node().text().to_string(), "<p>@name</p>");
//! ```

pub mod event;
pub mod sink;

mod grammar;

use std::ops::Range;

use rowan::GreenNode;

use crate::error::{SyntaxError, SyntaxErrorKind};
use crate::lexer::{Token, lex_with_options};
use crate::options::ParseOptions;
use crate::syntax_kind::{SyntaxKind, SyntaxNode};
use event::Event;
use sink::Sink;

/// Result of parsing: an immutable green tree plus the errors found.
///
/// The green tree is `Send + Sync`; [`Parse::syntax_node`] creates the
/// navigable red tree (with parent pointers) on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parse {
    green: GreenNode,
    errors: Vec<SyntaxError>,
}

impl Parse {
    pub fn syntax_node(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    pub fn green(&self) -> &GreenNode {
        &self.green
    }

    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    pub fn into_parts(self) -> (GreenNode, Vec<SyntaxError>) {
        (self.green, self.errors)
    }
}

/// The parser state machine.
///
/// Grammar functions receive `&mut Parser` and use its methods to:
///
/// - Inspect tokens: `current()`, `nth()`, `at()`, `depth()`, `at_end()`
/// - Consume tokens: `bump()`, `eat()`
/// - Build structure: `start()` → `Marker` → `complete()`/`abandon()`
/// - Report problems: `error()`
pub struct Parser<'t, 'input> {
    tokens: &'t [Token<'input>],
    options: &'t ParseOptions,
    pos: usize,
    events: Vec<Event>,
    errors: Vec<SyntaxError>,
}

impl<'t, 'input> Parser<'t, 'input> {
    pub fn new(tokens: &'t [Token<'input>], options: &'t ParseOptions) -> Self {
        Self {
            tokens,
            options,
            pos: 0,
            events: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Parse the tokens and return the tree with its errors.
    pub fn parse(mut self) -> Parse {
        grammar::root(&mut self);
        let mut errors = std::mem::take(&mut self.errors);
        errors.sort_by_key(|e| (e.range.start, e.range.end));
        let green = Sink::new(self.tokens, self.events).finish();
        Parse { green, errors }
    }

    pub fn options(&self) -> &'t ParseOptions {
        self.options
    }

    /// Start a new node and return a marker.
    pub fn start(&mut self) -> Marker {
        let pos = self.events.len();
        self.events.push(Event::Placeholder);
        Marker {
            pos,
            completed: false,
        }
    }

    /// Current token kind, or EOF if past end.
    pub fn current(&self) -> SyntaxKind {
        self.nth(0)
    }

    /// Look ahead n tokens.
    pub fn nth(&self, n: usize) -> SyntaxKind {
        self.tokens
            .get(self.pos + n)
            .map_or(SyntaxKind::EOF, |t| t.kind)
    }

    /// Mode depth of the current token, `None` at end of input.
    pub fn depth(&self) -> Option<u16> {
        self.nth_depth(0)
    }

    pub fn nth_depth(&self, n: usize) -> Option<u16> {
        self.tokens.get(self.pos + n).map(|t| t.depth)
    }

    /// Whether the current token belongs to a mode nested deeper than `depth`.
    pub fn deeper_than(&self, depth: u16) -> bool {
        self.depth().is_some_and(|d| d > depth)
    }

    /// Check if at end of input.
    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Check if current token is of given kind.
    pub fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    /// Check if the current token has the given kind and depth.
    pub fn at_in(&self, kind: SyntaxKind, depth: u16) -> bool {
        self.at(kind) && self.depth() == Some(depth)
    }

    /// Consume the current token if it matches.
    pub fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume the current token if it has the given kind and depth.
    pub fn eat_in(&mut self, kind: SyntaxKind, depth: u16) -> bool {
        if self.at_in(kind, depth) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume the current token unconditionally.
    pub fn bump(&mut self) {
        if !self.at_end() {
            let kind = self.current();
            self.events.push(Event::Token { kind });
            self.pos += 1;
        }
    }

    /// Get the text of the current token.
    pub fn current_text(&self) -> &'input str {
        self.nth_text(0)
    }

    pub fn nth_text(&self, n: usize) -> &'input str {
        self.tokens.get(self.pos + n).map_or("", |t| t.text)
    }

    /// Byte range of the current token; an empty range at end of input.
    pub fn current_range(&self) -> Range<usize> {
        match self.tokens.get(self.pos) {
            Some(token) => token.range(),
            None => {
                let end = self.tokens.last().map_or(0, |t| t.range().end);
                end..end
            }
        }
    }

    /// Check if we're at the start of a line: only horizontal whitespace
    /// separates the current token from a newline or the start of input.
    pub fn at_line_start(&self) -> bool {
        let mut back = self.pos;
        if back > 0 && self.tokens[back - 1].kind == SyntaxKind::WHITESPACE {
            back -= 1;
        }
        back == 0 || self.tokens[back - 1].kind == SyntaxKind::NEWLINE
    }

    pub fn error(&mut self, kind: SyntaxErrorKind, range: Range<usize>) {
        self.errors.push(SyntaxError::new(kind, range));
    }
}

/// A marker for a node being constructed.
///
/// `parser.start()` pushes a `Placeholder` event and hands back a `Marker`
/// pointing at it. Completing the marker turns the placeholder into a `Start`
/// event and pushes the matching `Finish`.
#[must_use = "Markers must be completed or abandoned, dropping them is a bug"]
pub struct Marker {
    /// Position in the events vector where our Placeholder lives
    pos: usize,
    /// Tracks whether complete() or abandon() was called
    completed: bool,
}

impl Marker {
    /// Complete this marker, creating a node of the given kind.
    pub fn complete(mut self, p: &mut Parser<'_, '_>, kind: SyntaxKind) {
        self.completed = true;
        let event_at_pos = &mut p.events[self.pos];
        assert!(matches!(event_at_pos, Event::Placeholder));
        *event_at_pos = Event::Start { kind };
        p.events.push(Event::Finish);
    }

    /// Abandon this marker without creating a node.
    ///
    /// The placeholder is removed when nothing was pushed after it, otherwise
    /// it stays inert and the Sink skips it.
    pub fn abandon(mut self, p: &mut Parser<'_, '_>) {
        self.completed = true;
        if self.pos == p.events.len() - 1 {
            match p.events.pop() {
                Some(Event::Placeholder) => {}
                _ => unreachable!(),
            }
        }
    }
}

impl Drop for Marker {
    fn drop(&mut self) {
        if !self.completed && !std::thread::panicking() {
            panic!("Marker must be either completed or abandoned");
        }
    }
}

/// Parse template source with no registered directives.
pub fn parse(source: &str) -> Parse {
    parse_with_options(source, &ParseOptions::default())
}

/// Parse template source, recognising the directives in `options`.
pub fn parse_with_options(source: &str, options: &ParseOptions) -> Parse {
    let tokens = lex_with_options(source, options);
    let parser = Parser::new(&tokens, options);
    let parse = parser.parse();
    log::trace!(
        "parsed {} bytes into {} tokens with {} errors",
        source.len(),
        tokens.len(),
        parse.errors.len()
    );
    parse
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_empty_input() {
        let parse = parse("");
        let tree = parse.syntax_node();
        assert_eq!(tree.kind(), SyntaxKind::ROOT);
        assert_eq!(tree.children().count(), 0);
        assert!(parse.errors().is_empty());
    }

    #[test]
    fn parse_preserves_all_text() {
        let input = "Hello, @world!";
        assert_eq!(parse(input).syntax_node().text(), input);
    }

    #[test]
    fn at_line_start_skips_indentation() {
        let tokens = lex("x\n  @y");
        let options = ParseOptions::default();
        let mut parser = Parser::new(&tokens, &options);
        assert!(parser.at_line_start());
        parser.bump(); // x
        assert!(!parser.at_line_start());
        parser.bump(); // \n
        parser.bump(); // indentation
        assert_eq!(parser.current(), SyntaxKind::TRANSITION);
        assert!(parser.at_line_start());
    }

    #[test]
    fn current_range_at_end_is_empty() {
        let tokens = lex("ab");
        let options = ParseOptions::default();
        let mut parser = Parser::new(&tokens, &options);
        parser.bump();
        assert_eq!(parser.current_range(), 2..2);
        assert_eq!(parser.depth(), None);
    }

    #[test]
    fn marker_must_be_completed() {
        let result = std::panic::catch_unwind(|| {
            let tokens = lex("test");
            let options = ParseOptions::default();
            let mut parser = Parser::new(&tokens, &options);
            let _marker = parser.start();
            // Marker dropped without completion - should panic
        });
        assert!(result.is_err());
    }

    #[test]
    fn marker_can_be_abandoned() {
        let tokens = lex("test");
        let options = ParseOptions::default();
        let mut parser = Parser::new(&tokens, &options);
        let marker = parser.start();
        marker.abandon(&mut parser);
        assert!(parser.events.is_empty());
    }
}
