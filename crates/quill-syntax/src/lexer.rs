//! # Lexer - Tokenizing Template Source
//!
//! Templates interleave two languages: markup and host code. The lexer runs
//! one [Logos] tokenizer per language and switches between them with an
//! explicit **mode stack** instead of recursing into another tokenizer
//! instance:
//!
//! ```text
//! <p>@{ var x = 1; <b>@x</b> }</p>
//!
//! <p>             depth 0  markup
//! @               depth 0  TRANSITION
//! { var x = 1;    depth 1  code block
//! <b>             depth 2  element inside code
//! @               depth 2  TRANSITION
//! x               depth 3  implicit expression
//! </b>            depth 2
//!  }              depth 1
//! </p>            depth 0
//! ```
//!
//! Every token records the depth of the mode that produced it. The parser
//! never re-derives mode changes: a construct that starts with a transition at
//! depth `d` owns every following token deeper than `d`.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## The Lossless Guarantee
//!
//! Every byte in the input appears in exactly one token, whatever mode is
//! active. Unrecognised characters become `TEXT` (markup) or `UNKNOWN` (host).
//!
//! ```
//! use quill_syntax::lexer::lex;
//!
//! let input = "<p>@{ var x = 1; }</p>\n";
//! let tokens = lex(input);
//!
//! let reconstructed: String = tokens.iter().map(|t| t.text).collect();
//! assert_eq!(input, reconstructed);
//! ```
//!
//! ## Modes
//!
//! | Mode | Entered by | Left at |
//! |---|---|---|
//! | markup (root) | start of input | never |
//! | code block | `@{` | matching `}` |
//! | statement | `@if`, `@foreach`, ... | closing `}` without continuation |
//! | explicit expression | `@(` | matching `)` |
//! | implicit expression | `@name` | first char that does not extend the member chain |
//! | directive | `@name` for a registered directive at line start | end of line, or end of its body |
//! | element | `<tag` at statement start inside code | matching close tag |
//! | markup line | `@:` inside code | end of line |

use std::ops::Range;

use logos::Logos;

use crate::options::{self, DirectiveBody, ParseOptions};
use crate::syntax_kind::SyntaxKind;

/// Markup-mode tokens.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupToken {
    #[regex(r"[ \t]+")]
    Whitespace,

    #[regex(r"\r?\n")]
    Newline,

    #[token("</")]
    LtSlash,

    #[token("<")]
    Lt,

    #[token("/>")]
    SlashGt,

    #[token(">")]
    Gt,

    #[token("=")]
    Eq,

    #[token("\"")]
    DQuote,

    #[token("'")]
    SQuote,

    /// Only structural inside markup directive bodies
    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("/")]
    Slash,

    #[regex(r#"[^ \t\r\n<>/="'@{}]+"#)]
    Text,
}

impl MarkupToken {
    pub fn to_syntax_kind(self) -> SyntaxKind {
        match self {
            MarkupToken::Whitespace => SyntaxKind::WHITESPACE,
            MarkupToken::Newline => SyntaxKind::NEWLINE,
            MarkupToken::LtSlash => SyntaxKind::LT_SLASH,
            MarkupToken::Lt => SyntaxKind::LT,
            MarkupToken::SlashGt => SyntaxKind::SLASH_GT,
            MarkupToken::Gt => SyntaxKind::GT,
            MarkupToken::Eq => SyntaxKind::EQ,
            MarkupToken::DQuote => SyntaxKind::DQUOTE,
            MarkupToken::SQuote => SyntaxKind::SQUOTE,
            MarkupToken::LBrace | MarkupToken::RBrace | MarkupToken::Slash | MarkupToken::Text => {
                SyntaxKind::TEXT
            }
        }
    }
}

/// Host-code tokens.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostToken {
    #[regex(r"[ \t]+")]
    Whitespace,

    #[regex(r"\r?\n")]
    Newline,

    #[regex(r"@?[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex(r"[0-9][0-9A-Za-z_]*(\.[0-9][0-9A-Za-z_]*)?")]
    Number,

    /// Unterminated literals stop at end of line; the parser reports them.
    #[regex(r#""([^"\\\r\n]|\\.)*"?"#)]
    #[regex(r#"@"([^"]|"")*"?"#)]
    String,

    #[regex(r"'([^'\\\r\n]|\\.)*'?")]
    Char,

    #[regex(r"//[^\r\n]*")]
    LineComment,

    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    BlockComment,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(";")]
    Semicolon,

    #[token(".")]
    Dot,

    #[token(",")]
    Comma,

    #[token(":")]
    Colon,

    #[regex(r"[+\-*/%=!<>&|^~?]+")]
    Operator,
}

impl HostToken {
    pub fn to_syntax_kind(self) -> SyntaxKind {
        match self {
            HostToken::Whitespace => SyntaxKind::WHITESPACE,
            HostToken::Newline => SyntaxKind::NEWLINE,
            HostToken::Ident => SyntaxKind::IDENT,
            HostToken::Number => SyntaxKind::NUMBER,
            HostToken::String => SyntaxKind::STRING,
            HostToken::Char => SyntaxKind::CHAR,
            HostToken::LineComment => SyntaxKind::LINE_COMMENT,
            HostToken::BlockComment => SyntaxKind::BLOCK_COMMENT,
            HostToken::LBrace => SyntaxKind::L_BRACE,
            HostToken::RBrace => SyntaxKind::R_BRACE,
            HostToken::LParen => SyntaxKind::L_PAREN,
            HostToken::RParen => SyntaxKind::R_PAREN,
            HostToken::LBracket => SyntaxKind::L_BRACKET,
            HostToken::RBracket => SyntaxKind::R_BRACKET,
            HostToken::Semicolon => SyntaxKind::SEMICOLON,
            HostToken::Dot => SyntaxKind::DOT,
            HostToken::Comma => SyntaxKind::COMMA,
            HostToken::Colon => SyntaxKind::COLON,
            HostToken::Operator => SyntaxKind::OPERATOR,
        }
    }
}

/// A lexed token: kind, text slice, byte offset and mode depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
    pub offset: usize,
    /// Depth of the mode stack when the token was produced (root markup is 0).
    pub depth: u16,
}

impl Token<'_> {
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.text.len()
    }
}

/// Lex with no registered directives.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    lex_with_options(input, &ParseOptions::default())
}

/// Lex the input into a sequence of tokens.
///
/// Guarantees that all bytes from the input appear in the output tokens.
pub fn lex_with_options<'a>(input: &'a str, options: &ParseOptions) -> Vec<Token<'a>> {
    let mut tokenizer = Tokenizer {
        source: input,
        pos: 0,
        modes: vec![Mode::Markup],
        options,
        tokens: Vec::new(),
    };
    while tokenizer.pos < input.len() {
        tokenizer.step();
    }
    tokenizer.tokens
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Open { void: bool },
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CodeState {
    braces: u32,
    parens: u32,
    statement: bool,
    do_loop: bool,
    seen_block: bool,
    statement_start: bool,
    directive_body: bool,
}

impl CodeState {
    fn block() -> Self {
        Self {
            braces: 0,
            parens: 0,
            statement: false,
            do_loop: false,
            seen_block: false,
            statement_start: false,
            directive_body: false,
        }
    }

    fn statement(keyword: &str) -> Self {
        Self {
            statement: true,
            do_loop: keyword == "do",
            ..Self::block()
        }
    }

    fn directive_body() -> Self {
        Self {
            braces: 1,
            statement_start: true,
            directive_body: true,
            ..Self::block()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Markup,
    Element { tags: u32, pending: Option<Tag> },
    MarkupLine,
    MarkupBody { braces: u32 },
    Code(CodeState),
    Explicit { parens: u32 },
    Implicit { groups: u32, expect_ident: bool },
    Directive { body: DirectiveBody },
}

struct Tokenizer<'a, 'o> {
    source: &'a str,
    pos: usize,
    modes: Vec<Mode>,
    options: &'o ParseOptions,
    tokens: Vec<Token<'a>>,
}

impl<'a> Tokenizer<'a, '_> {
    fn step(&mut self) {
        match self.top() {
            Mode::Markup | Mode::Element { .. } | Mode::MarkupLine | Mode::MarkupBody { .. } => {
                self.markup_step()
            }
            Mode::Code(state) => self.code_step(state),
            Mode::Explicit { parens } => self.explicit_step(parens),
            Mode::Implicit {
                groups,
                expect_ident,
            } => self.implicit_step(groups, expect_ident),
            Mode::Directive { body } => self.directive_step(body),
        }
    }

    fn top(&self) -> Mode {
        self.modes.last().copied().unwrap_or(Mode::Markup)
    }

    fn set_top(&mut self, mode: Mode) {
        if let Some(top) = self.modes.last_mut() {
            *top = mode;
        }
    }

    fn push_mode(&mut self, mode: Mode) {
        self.modes.push(mode);
    }

    fn pop_mode(&mut self) {
        // The root markup mode is never popped.
        if self.modes.len() > 1 {
            self.modes.pop();
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn emit(&mut self, kind: SyntaxKind, len: usize) {
        let depth = u16::try_from(self.modes.len() - 1).unwrap_or(u16::MAX);
        self.tokens.push(Token {
            kind,
            text: &self.source[self.pos..self.pos + len],
            offset: self.pos,
            depth,
        });
        self.pos += len;
    }

    fn prev_char(&self) -> Option<char> {
        self.source[..self.pos].chars().next_back()
    }

    fn at_line_start(&self) -> bool {
        self.source[..self.pos]
            .rsplit('\n')
            .next()
            .is_none_or(|line| line.chars().all(|c| c == ' ' || c == '\t'))
    }

    // === Markup ===

    fn markup_step(&mut self) {
        let rest = self.rest();
        if rest.starts_with("@*") {
            self.comment();
            return;
        }
        if rest.starts_with("@@") {
            self.emit(SyntaxKind::ESCAPED_TRANSITION, 2);
            return;
        }
        if rest.starts_with('@') {
            if self.prev_char().is_some_and(char::is_alphanumeric) {
                // e-mail addresses stay markup
                self.emit(SyntaxKind::TEXT, 1);
            } else {
                self.transition();
            }
            return;
        }

        let (token, len) = next_markup(rest);
        let kind = token.map_or(SyntaxKind::TEXT, MarkupToken::to_syntax_kind);
        match self.top() {
            Mode::Element { tags, pending } => self.element_token(kind, len, tags, pending),
            Mode::MarkupLine => {
                self.emit(kind, len);
                if kind == SyntaxKind::NEWLINE {
                    self.pop_mode();
                }
            }
            Mode::MarkupBody { braces } => match token {
                Some(MarkupToken::LBrace) => {
                    self.set_top(Mode::MarkupBody { braces: braces + 1 });
                    self.emit(kind, len);
                }
                Some(MarkupToken::RBrace) if braces == 0 => self.close_directive_body(),
                Some(MarkupToken::RBrace) => {
                    self.set_top(Mode::MarkupBody { braces: braces - 1 });
                    self.emit(kind, len);
                }
                _ => self.emit(kind, len),
            },
            _ => self.emit(kind, len),
        }
    }

    fn element_token(&mut self, kind: SyntaxKind, len: usize, tags: u32, pending: Option<Tag>) {
        let mut tags = tags;
        let mut pending = pending;
        let mut finished = false;
        match kind {
            SyntaxKind::LT => {
                let name = tag_name(&self.rest()[1..]);
                pending = (!name.is_empty()).then(|| Tag::Open {
                    void: options::is_void_element(name),
                });
            }
            SyntaxKind::LT_SLASH => pending = Some(Tag::Close),
            SyntaxKind::SLASH_GT => {
                if let Some(Tag::Open { .. }) = pending {
                    pending = None;
                    finished = tags == 0;
                }
            }
            SyntaxKind::GT => match pending.take() {
                Some(Tag::Open { void: false }) => tags += 1,
                Some(Tag::Open { void: true }) => finished = tags == 0,
                Some(Tag::Close) => {
                    tags = tags.saturating_sub(1);
                    finished = tags == 0;
                }
                None => {}
            },
            _ => {}
        }
        self.set_top(Mode::Element { tags, pending });
        self.emit(kind, len);
        if finished {
            self.pop_mode();
        }
    }

    /// At an `@` that starts a construct.
    fn transition(&mut self) {
        let after = &self.rest()[1..];
        let Some(next) = after.chars().next() else {
            self.emit(SyntaxKind::TRANSITION, 1);
            return;
        };
        match next {
            '{' => {
                self.emit(SyntaxKind::TRANSITION, 1);
                self.push_mode(Mode::Code(CodeState::block()));
            }
            '(' => {
                self.emit(SyntaxKind::TRANSITION, 1);
                self.push_mode(Mode::Explicit { parens: 0 });
            }
            c if is_ident_start(c) => {
                let word = &after[..ident_len(after)];
                let directive = self
                    .options
                    .directive(word)
                    .filter(|_| self.at_line_start())
                    .map(|d| d.body);
                self.emit(SyntaxKind::TRANSITION, 1);
                if options::is_statement_keyword(word) {
                    self.push_mode(Mode::Code(CodeState::statement(word)));
                } else if let Some(body) = directive {
                    self.push_mode(Mode::Directive { body });
                } else {
                    self.push_mode(Mode::Implicit {
                        groups: 0,
                        expect_ident: true,
                    });
                }
            }
            _ => self.emit(SyntaxKind::TRANSITION, 1),
        }
    }

    fn comment(&mut self) {
        let rest = self.rest();
        let len = rest[2..].find("*@").map_or(rest.len(), |end| end + 4);
        self.emit(SyntaxKind::TEMPLATE_COMMENT, len);
    }

    /// Closes a directive body at its final `}`; the brace belongs to the
    /// directive, not the body.
    fn close_directive_body(&mut self) {
        self.pop_mode();
        self.emit(SyntaxKind::R_BRACE, 1);
        self.pop_mode();
    }

    // === Host code ===

    fn code_step(&mut self, mut state: CodeState) {
        let rest = self.rest();
        if rest.starts_with("@*") {
            self.comment();
            return;
        }
        if rest.starts_with("@:") {
            self.emit(SyntaxKind::TRANSITION, 1);
            state.statement_start = true;
            self.set_top(Mode::Code(state));
            self.push_mode(Mode::MarkupLine);
            self.emit(SyntaxKind::COLON, 1);
            return;
        }
        if state.statement_start && starts_element(rest) {
            self.push_mode(Mode::Element {
                tags: 0,
                pending: None,
            });
            return;
        }

        let (token, len) = next_host(rest);
        let kind = token.map_or(SyntaxKind::UNKNOWN, HostToken::to_syntax_kind);
        let at_statement_level = state.statement && state.braces == 0 && state.parens == 0;

        match kind {
            SyntaxKind::NEWLINE if at_statement_level && !self.statement_continues(&state) => {
                // Statement without a block; the newline goes back to markup.
                self.pop_mode();
                return;
            }
            SyntaxKind::SEMICOLON if at_statement_level => {
                self.emit(kind, len);
                self.pop_mode();
                return;
            }
            SyntaxKind::L_BRACE => {
                state.braces += 1;
                state.seen_block |= state.statement;
            }
            SyntaxKind::R_BRACE => {
                state.braces = state.braces.saturating_sub(1);
                if state.braces == 0 {
                    self.close_code(state, len);
                    return;
                }
            }
            SyntaxKind::L_PAREN | SyntaxKind::L_BRACKET => state.parens += 1,
            SyntaxKind::R_PAREN | SyntaxKind::R_BRACKET => {
                state.parens = state.parens.saturating_sub(1)
            }
            _ => {}
        }

        if !kind.is_trivia() && !matches!(kind, SyntaxKind::LINE_COMMENT | SyntaxKind::BLOCK_COMMENT)
        {
            state.statement_start = matches!(
                kind,
                SyntaxKind::L_BRACE | SyntaxKind::R_BRACE | SyntaxKind::SEMICOLON | SyntaxKind::COLON
            );
        }
        self.set_top(Mode::Code(state));
        self.emit(kind, len);
    }

    /// At the `}` that brings a code mode back to zero braces.
    fn close_code(&mut self, mut state: CodeState, len: usize) {
        if state.directive_body {
            self.close_directive_body();
            return;
        }
        self.emit(SyntaxKind::R_BRACE, len);
        if state.statement && self.statement_continues(&state) {
            state.statement_start = false;
            self.set_top(Mode::Code(state));
        } else {
            self.pop_mode();
        }
    }

    /// Whether a statement carries on past the current position: a block is
    /// about to open, or a continuation keyword follows the closing brace.
    fn statement_continues(&self, state: &CodeState) -> bool {
        let tail = self.rest().trim_start();
        if tail.starts_with('{') {
            return true;
        }
        if !state.seen_block {
            return false;
        }
        let word = &tail[..ident_len(tail)];
        options::CONTINUATION_KEYWORDS.contains(&word) || (state.do_loop && word == "while")
    }

    fn explicit_step(&mut self, parens: u32) {
        let (token, len) = next_host(self.rest());
        let kind = token.map_or(SyntaxKind::UNKNOWN, HostToken::to_syntax_kind);
        let parens = match kind {
            SyntaxKind::L_PAREN | SyntaxKind::L_BRACKET => parens + 1,
            SyntaxKind::R_PAREN | SyntaxKind::R_BRACKET => parens.saturating_sub(1),
            _ => parens,
        };
        self.set_top(Mode::Explicit { parens });
        self.emit(kind, len);
        if parens == 0 && matches!(kind, SyntaxKind::R_PAREN | SyntaxKind::R_BRACKET) {
            self.pop_mode();
        }
    }

    fn implicit_step(&mut self, groups: u32, expect_ident: bool) {
        let rest = self.rest();
        if groups > 0 {
            let (token, len) = next_host(rest);
            let kind = token.map_or(SyntaxKind::UNKNOWN, HostToken::to_syntax_kind);
            let groups = match kind {
                SyntaxKind::L_PAREN | SyntaxKind::L_BRACKET => groups + 1,
                SyntaxKind::R_PAREN | SyntaxKind::R_BRACKET => groups - 1,
                _ => groups,
            };
            self.set_top(Mode::Implicit {
                groups,
                expect_ident: false,
            });
            self.emit(kind, len);
            return;
        }

        if expect_ident {
            let len = ident_len(rest);
            if len == 0 {
                self.pop_mode();
                return;
            }
            self.set_top(Mode::Implicit {
                groups: 0,
                expect_ident: false,
            });
            self.emit(SyntaxKind::IDENT, len);
            return;
        }

        let mut chars = rest.chars();
        match chars.next() {
            Some('.') if chars.next().is_some_and(is_ident_start) => {
                self.set_top(Mode::Implicit {
                    groups: 0,
                    expect_ident: true,
                });
                self.emit(SyntaxKind::DOT, 1);
            }
            Some('(') => {
                self.set_top(Mode::Implicit {
                    groups: 1,
                    expect_ident: false,
                });
                self.emit(SyntaxKind::L_PAREN, 1);
            }
            Some('[') => {
                self.set_top(Mode::Implicit {
                    groups: 1,
                    expect_ident: false,
                });
                self.emit(SyntaxKind::L_BRACKET, 1);
            }
            _ => self.pop_mode(),
        }
    }

    fn directive_step(&mut self, body: DirectiveBody) {
        let rest = self.rest();
        let (token, len) = next_host(rest);
        let kind = token.map_or(SyntaxKind::UNKNOWN, HostToken::to_syntax_kind);
        match (kind, body) {
            (SyntaxKind::NEWLINE, DirectiveBody::None) => self.pop_mode(),
            (SyntaxKind::NEWLINE, _) => {
                if rest.trim_start().starts_with('{') {
                    self.emit(kind, len);
                } else {
                    self.pop_mode();
                }
            }
            (SyntaxKind::L_BRACE, DirectiveBody::Code) => {
                self.emit(kind, len);
                self.push_mode(Mode::Code(CodeState::directive_body()));
            }
            (SyntaxKind::L_BRACE, DirectiveBody::Markup) => {
                self.emit(kind, len);
                self.push_mode(Mode::MarkupBody { braces: 0 });
            }
            _ => self.emit(kind, len),
        }
    }
}

fn next_markup(rest: &str) -> (Option<MarkupToken>, usize) {
    let mut lexer = MarkupToken::lexer(rest);
    match lexer.next() {
        Some(Ok(token)) => (Some(token), lexer.span().end),
        _ => (None, first_char_len(rest)),
    }
}

fn next_host(rest: &str) -> (Option<HostToken>, usize) {
    let mut lexer = HostToken::lexer(rest);
    match lexer.next() {
        Some(Ok(token)) => (Some(token), lexer.span().end),
        _ => (None, first_char_len(rest)),
    }
}

fn first_char_len(s: &str) -> usize {
    s.chars().next().map_or(1, char::len_utf8)
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn ident_len(s: &str) -> usize {
    if !s.chars().next().is_some_and(is_ident_start) {
        return 0;
    }
    s.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(s.len())
}

fn tag_name(s: &str) -> &str {
    let end = s
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == ':'))
        .unwrap_or(s.len());
    &s[..end]
}

fn starts_element(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next() == Some('<') && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use SyntaxKind::*;

    fn shape(input: &str) -> Vec<(SyntaxKind, &str, u16)> {
        shape_with(input, &ParseOptions::default())
    }

    fn shape_with<'a>(input: &'a str, options: &ParseOptions) -> Vec<(SyntaxKind, &'a str, u16)> {
        lex_with_options(input, options)
            .into_iter()
            .map(|t| (t.kind, t.text, t.depth))
            .collect()
    }

    fn directives() -> ParseOptions {
        ParseOptions::default()
            .with_directive("using", DirectiveBody::None)
            .with_directive("functions", DirectiveBody::Code)
            .with_directive("section", DirectiveBody::Markup)
    }

    #[test]
    fn lex_empty_input() {
        assert_eq!(lex(""), vec![]);
    }

    #[test]
    fn lex_plain_markup() {
        assert_eq!(
            shape("<p>hi</p>"),
            vec![
                (LT, "<", 0),
                (TEXT, "p", 0),
                (GT, ">", 0),
                (TEXT, "hi", 0),
                (LT_SLASH, "</", 0),
                (TEXT, "p", 0),
                (GT, ">", 0),
            ]
        );
    }

    #[test]
    fn lex_code_block() {
        assert_eq!(
            shape("@{ x; }"),
            vec![
                (TRANSITION, "@", 0),
                (L_BRACE, "{", 1),
                (WHITESPACE, " ", 1),
                (IDENT, "x", 1),
                (SEMICOLON, ";", 1),
                (WHITESPACE, " ", 1),
                (R_BRACE, "}", 1),
            ]
        );
    }

    #[test]
    fn lex_implicit_expression_member_chain() {
        assert_eq!(
            shape("@a.b(c) d"),
            vec![
                (TRANSITION, "@", 0),
                (IDENT, "a", 1),
                (DOT, ".", 1),
                (IDENT, "b", 1),
                (L_PAREN, "(", 1),
                (IDENT, "c", 1),
                (R_PAREN, ")", 1),
                (WHITESPACE, " ", 0),
                (TEXT, "d", 0),
            ]
        );
    }

    #[test]
    fn trailing_dot_is_markup() {
        assert_eq!(
            shape("@name."),
            vec![(TRANSITION, "@", 0), (IDENT, "name", 1), (TEXT, ".", 0)]
        );
    }

    #[test]
    fn email_address_stays_markup() {
        assert_eq!(
            shape("a@b.com"),
            vec![(TEXT, "a", 0), (TEXT, "@", 0), (TEXT, "b.com", 0)]
        );
    }

    #[test]
    fn escaped_transition() {
        assert_eq!(
            shape("@@x"),
            vec![(ESCAPED_TRANSITION, "@@", 0), (TEXT, "x", 0)]
        );
    }

    #[rstest]
    #[case("@* note *@x", "@* note *@")]
    #[case("@* never closed", "@* never closed")]
    fn template_comment(#[case] input: &str, #[case] comment: &str) {
        let tokens = lex(input);
        assert_eq!(tokens[0].kind, TEMPLATE_COMMENT);
        assert_eq!(tokens[0].text, comment);
    }

    #[test]
    fn markup_nested_in_code() {
        assert_eq!(
            shape("@{ <p>@x</p> }"),
            vec![
                (TRANSITION, "@", 0),
                (L_BRACE, "{", 1),
                (WHITESPACE, " ", 1),
                (LT, "<", 2),
                (TEXT, "p", 2),
                (GT, ">", 2),
                (TRANSITION, "@", 2),
                (IDENT, "x", 3),
                (LT_SLASH, "</", 2),
                (TEXT, "p", 2),
                (GT, ">", 2),
                (WHITESPACE, " ", 1),
                (R_BRACE, "}", 1),
            ]
        );
    }

    #[test]
    fn void_element_returns_to_code() {
        assert_eq!(
            shape("@{ <br> x; }"),
            vec![
                (TRANSITION, "@", 0),
                (L_BRACE, "{", 1),
                (WHITESPACE, " ", 1),
                (LT, "<", 2),
                (TEXT, "br", 2),
                (GT, ">", 2),
                (WHITESPACE, " ", 1),
                (IDENT, "x", 1),
                (SEMICOLON, ";", 1),
                (WHITESPACE, " ", 1),
                (R_BRACE, "}", 1),
            ]
        );
    }

    #[test]
    fn comparison_in_code_is_not_markup() {
        let tokens = lex("@{ var b = a <b; }");
        assert!(tokens.iter().all(|t| t.depth <= 1));
        assert!(tokens.iter().any(|t| t.kind == OPERATOR && t.text == "<"));
    }

    #[test]
    fn statement_with_else_continuation() {
        let tokens = lex("@if (a) { x(); } else { y(); }\n<p>");
        let code: String = tokens
            .iter()
            .filter(|t| t.depth == 1)
            .map(|t| t.text)
            .collect();
        assert_eq!(code, "if (a) { x(); } else { y(); }");
        assert_eq!(tokens.last().map(|t| (t.kind, t.depth)), Some((GT, 0)));
    }

    #[test]
    fn statement_without_continuation_ends_at_brace() {
        let tokens = lex("@if (a) { }\nthen");
        let last = tokens.last().map(|t| (t.kind, t.text, t.depth));
        assert_eq!(last, Some((TEXT, "then", 0)));
    }

    #[test]
    fn directive_header_ends_at_newline() {
        assert_eq!(
            shape_with("@using System\n<p>", &directives()),
            vec![
                (TRANSITION, "@", 0),
                (IDENT, "using", 1),
                (WHITESPACE, " ", 1),
                (IDENT, "System", 1),
                (NEWLINE, "\n", 0),
                (LT, "<", 0),
                (TEXT, "p", 0),
                (GT, ">", 0),
            ]
        );
    }

    #[test]
    fn directive_needs_line_start() {
        let tokens = shape_with("x @using", &directives());
        assert_eq!(tokens[2], (TRANSITION, "@", 0));
        assert_eq!(tokens[3], (IDENT, "using", 1));
        assert_eq!(tokens.len(), 4);
    }

    #[test]
    fn markup_directive_body() {
        assert_eq!(
            shape_with("@section S { <p>{}</p> }", &directives()),
            vec![
                (TRANSITION, "@", 0),
                (IDENT, "section", 1),
                (WHITESPACE, " ", 1),
                (IDENT, "S", 1),
                (WHITESPACE, " ", 1),
                (L_BRACE, "{", 1),
                (WHITESPACE, " ", 2),
                (LT, "<", 2),
                (TEXT, "p", 2),
                (GT, ">", 2),
                (TEXT, "{", 2),
                (TEXT, "}", 2),
                (LT_SLASH, "</", 2),
                (TEXT, "p", 2),
                (GT, ">", 2),
                (WHITESPACE, " ", 2),
                (R_BRACE, "}", 1),
            ]
        );
    }

    #[test]
    fn code_directive_body_on_next_line() {
        let tokens = shape_with("@functions\n{ int x; }\n", &directives());
        assert_eq!(tokens[2], (NEWLINE, "\n", 1));
        assert_eq!(tokens[3], (L_BRACE, "{", 1));
        assert!(tokens.contains(&(IDENT, "int", 2)));
        assert_eq!(tokens[tokens.len() - 2], (R_BRACE, "}", 1));
        assert_eq!(tokens[tokens.len() - 1], (NEWLINE, "\n", 0));
    }

    #[test]
    fn markup_line_in_code() {
        assert_eq!(
            shape("@{ @:hi\n}"),
            vec![
                (TRANSITION, "@", 0),
                (L_BRACE, "{", 1),
                (WHITESPACE, " ", 1),
                (TRANSITION, "@", 1),
                (COLON, ":", 2),
                (TEXT, "hi", 2),
                (NEWLINE, "\n", 2),
                (R_BRACE, "}", 1),
            ]
        );
    }

    #[test]
    fn brace_closes_block_even_with_open_paren() {
        let tokens = shape("<p>@{ if (x } </p>");
        let closing = tokens.iter().position(|t| t.0 == R_BRACE);
        assert_eq!(closing, Some(11));
        assert_eq!(
            &tokens[12..],
            &[
                (WHITESPACE, " ", 0),
                (LT_SLASH, "</", 0),
                (TEXT, "p", 0),
                (GT, ">", 0)
            ]
        );
    }

    #[test]
    fn unterminated_block_runs_to_end() {
        let tokens = lex("@{ x");
        assert!(tokens[1..].iter().all(|t| t.depth == 1));
    }

    #[test]
    fn offsets_are_contiguous() {
        let input = "<a href=\"@url\">@(1 + 2)</a>@* c *@";
        let tokens = lex(input);
        let mut expected = 0;
        for token in &tokens {
            assert_eq!(token.offset, expected);
            expected = token.range().end;
        }
        assert_eq!(expected, input.len());
    }

    #[rstest]
    #[case("Hello, world!\n")]
    #[case("<p>@{ if (x } </p>")]
    #[case("@foreach (var i in items) {\n  <li>@i</li>\n}\n")]
    #[case("@{ var s = \"unterminated\n}")]
    #[case("@section Scripts {\n<script>var a = {};</script>\n}\n")]
    #[case("café @naïve ünïcode\r\n")]
    #[case("@")]
    #[case("@(")]
    #[case("@{ <p>never closed")]
    fn all_bytes_preserved(#[case] input: &str) {
        let tokens = lex_with_options(input, &directives());
        let reconstructed: String = tokens.iter().map(|t| t.text).collect();
        assert_eq!(input, reconstructed);
    }
}
