//! Host code grammar rules.
//!
//! Host code is not parsed beyond delimiter balance: runs of host tokens
//! become `HOST_CODE` nodes, nested markup and markup lines become their own
//! nodes, and `(` `[` `{` are matched so unbalanced input can be reported.

use std::ops::Range;

use crate::error::SyntaxErrorKind;
use crate::parser::Parser;
use crate::syntax_kind::SyntaxKind;

use super::{markup, template};

/// Open delimiters inside one host-code construct.
#[derive(Debug, Default)]
struct Delimiters {
    open: Vec<(SyntaxKind, Range<usize>)>,
    saw_block: bool,
}

enum Close {
    Matched,
    Unmatched,
}

impl Delimiters {
    fn open(&mut self, kind: SyntaxKind, range: Range<usize>) {
        self.saw_block |= kind == SyntaxKind::L_BRACE;
        self.open.push((kind, range));
    }

    /// Index of the opener a closing delimiter would match.
    ///
    /// Braces are only balanced against braces, and a `)` or `]` never looks
    /// past an open brace, so brace nesting always agrees with the lexer.
    fn opener_for(&self, close: SyntaxKind) -> Option<usize> {
        let want = opener(close)?;
        for (index, (kind, _)) in self.open.iter().enumerate().rev() {
            if *kind == want {
                return Some(index);
            }
            if *kind == SyntaxKind::L_BRACE {
                return None;
            }
        }
        None
    }

    fn close(&mut self, p: &mut Parser<'_, '_>, kind: SyntaxKind) -> Close {
        match self.opener_for(kind) {
            Some(index) => {
                for (kind, range) in self.open.drain(index + 1..) {
                    p.error(unclosed(kind), range);
                }
                self.open.pop();
                Close::Matched
            }
            None => Close::Unmatched,
        }
    }

    fn report(self, p: &mut Parser<'_, '_>) {
        for (kind, range) in self.open {
            p.error(unclosed(kind), range);
        }
    }
}

fn opener(close: SyntaxKind) -> Option<SyntaxKind> {
    match close {
        SyntaxKind::R_BRACE => Some(SyntaxKind::L_BRACE),
        SyntaxKind::R_PAREN => Some(SyntaxKind::L_PAREN),
        SyntaxKind::R_BRACKET => Some(SyntaxKind::L_BRACKET),
        _ => None,
    }
}

fn unclosed(kind: SyntaxKind) -> SyntaxErrorKind {
    let open = match kind {
        SyntaxKind::L_BRACE => '{',
        SyntaxKind::L_PAREN => '(',
        _ => '[',
    };
    SyntaxErrorKind::UnclosedDelimiter { open }
}

fn unexpected(kind: SyntaxKind) -> SyntaxErrorKind {
    let close = match kind {
        SyntaxKind::R_BRACE => '}',
        SyntaxKind::R_PAREN => ')',
        _ => ']',
    };
    SyntaxErrorKind::UnexpectedDelimiter { close }
}

/// Whether a string or character literal token has its closing quote.
fn is_terminated_literal(text: &str) -> bool {
    if let Some(verbatim) = text.strip_prefix("@\"") {
        // `""` escapes a quote, so an odd trailing run closes the literal
        let quotes = verbatim.chars().rev().take_while(|&c| c == '"').count();
        return quotes % 2 == 1;
    }
    let mut chars = text.chars();
    let Some(quote) = chars.next() else {
        return false;
    };
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            c if c == quote => return chars.next().is_none(),
            _ => {}
        }
    }
    false
}

/// Host code at `depth` until a shallower token or an unmatched `closer`.
fn content(
    p: &mut Parser<'_, '_>,
    depth: u16,
    closer: Option<SyntaxKind>,
    delims: &mut Delimiters,
) {
    while let Some(current) = p.depth() {
        if current < depth {
            break;
        }
        if current > depth {
            markup::content(p, depth + 1);
            continue;
        }
        match p.current() {
            SyntaxKind::TRANSITION => template::transition(p, depth),
            SyntaxKind::TEMPLATE_COMMENT => template::comment(p),
            kind if ends_construct(kind, closer, delims) => break,
            _ => host_code(p, depth, closer, delims),
        }
    }
}

fn ends_construct(kind: SyntaxKind, closer: Option<SyntaxKind>, delims: &Delimiters) -> bool {
    closer == Some(kind) && delims.opener_for(kind).is_none()
}

fn host_code(
    p: &mut Parser<'_, '_>,
    depth: u16,
    closer: Option<SyntaxKind>,
    delims: &mut Delimiters,
) {
    let m = p.start();
    while p.depth() == Some(depth) {
        let kind = p.current();
        let range = p.current_range();
        match kind {
            SyntaxKind::TRANSITION | SyntaxKind::TEMPLATE_COMMENT => break,
            _ if ends_construct(kind, closer, delims) => break,
            SyntaxKind::L_BRACE | SyntaxKind::L_PAREN | SyntaxKind::L_BRACKET => {
                delims.open(kind, range);
            }
            SyntaxKind::R_BRACE | SyntaxKind::R_PAREN | SyntaxKind::R_BRACKET => {
                if let Close::Unmatched = delims.close(p, kind) {
                    p.error(unexpected(kind), range);
                }
            }
            SyntaxKind::STRING | SyntaxKind::CHAR if !is_terminated_literal(p.current_text()) => {
                p.error(SyntaxErrorKind::UnterminatedString, range);
            }
            _ => {}
        }
        p.bump();
    }
    m.complete(p, SyntaxKind::HOST_CODE);
}

/// Code content of a directive body; the closing brace is at `depth - 1`.
pub(super) fn body(p: &mut Parser<'_, '_>, depth: u16) {
    let mut delims = Delimiters::default();
    content(p, depth, None, &mut delims);
    delims.report(p);
}

/// `@{ ... }`
pub(super) fn block(p: &mut Parser<'_, '_>, depth: u16) {
    let inner = depth + 1;
    let m = p.start();
    let start = p.current_range().start;
    p.bump(); // @
    p.bump(); // {
    let mut delims = Delimiters::default();
    content(p, inner, Some(SyntaxKind::R_BRACE), &mut delims);
    delims.report(p);
    if !p.eat_in(SyntaxKind::R_BRACE, inner) {
        p.error(SyntaxErrorKind::UnterminatedCodeBlock, start..start + 2);
    }
    m.complete(p, SyntaxKind::CODE_BLOCK);
}

/// `@( ... )`
pub(super) fn explicit_expression(p: &mut Parser<'_, '_>, depth: u16) {
    let inner = depth + 1;
    let m = p.start();
    let start = p.current_range().start;
    p.bump(); // @
    p.bump(); // (
    let mut delims = Delimiters::default();
    content(p, inner, Some(SyntaxKind::R_PAREN), &mut delims);
    delims.report(p);
    if !p.eat_in(SyntaxKind::R_PAREN, inner) {
        p.error(
            SyntaxErrorKind::UnterminatedExplicitExpression,
            start..start + 2,
        );
    }
    m.complete(p, SyntaxKind::EXPLICIT_EXPRESSION);
}

/// `@name.member(args)[index]`
pub(super) fn implicit_expression(p: &mut Parser<'_, '_>, depth: u16) {
    let m = p.start();
    p.bump(); // @
    let mut delims = Delimiters::default();
    content(p, depth + 1, None, &mut delims);
    delims.report(p);
    m.complete(p, SyntaxKind::IMPLICIT_EXPRESSION);
}

/// `@if (...) { ... } else { ... }` and the other keyword statements.
pub(super) fn statement(p: &mut Parser<'_, '_>, depth: u16) {
    let m = p.start();
    p.bump(); // @
    let keyword = p.current_text().to_string();
    let keyword_range = p.current_range();
    let mut delims = Delimiters::default();
    content(p, depth + 1, None, &mut delims);
    let saw_block = delims.saw_block;
    delims.report(p);
    if !saw_block {
        p.error(SyntaxErrorKind::ExpectedStatementBlock { keyword }, keyword_range);
    }
    m.complete(p, SyntaxKind::STATEMENT);
}

#[cfg(test)]
mod tests {
    use super::is_terminated_literal;
    use rstest::rstest;

    #[rstest]
    #[case("\"abc\"", true)]
    #[case("\"a\\\"b\"", true)]
    #[case("\"abc", false)]
    #[case("\"a\\\"", false)]
    #[case("'x'", true)]
    #[case("'\\''", true)]
    #[case("'", false)]
    #[case("@\"a\"", true)]
    #[case("@\"a\"\"", false)]
    #[case("@\"a\"\"\"", true)]
    fn literal_termination(#[case] text: &str, #[case] terminated: bool) {
        assert_eq!(is_terminated_literal(text), terminated);
    }
}
