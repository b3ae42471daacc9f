//! Template constructs: what follows a transition, directives and comments.

use crate::error::SyntaxErrorKind;
use crate::options::{self, DirectiveBody};
use crate::parser::Parser;
use crate::syntax_kind::SyntaxKind;

use super::{code, markup};

/// At a `TRANSITION` token at `depth`.
pub(super) fn transition(p: &mut Parser<'_, '_>, depth: u16) {
    if p.nth_depth(1) != Some(depth + 1) {
        invalid_transition(p);
        return;
    }
    match p.nth(1) {
        SyntaxKind::L_BRACE => code::block(p, depth),
        SyntaxKind::L_PAREN => code::explicit_expression(p, depth),
        SyntaxKind::COLON => markup_line(p, depth),
        SyntaxKind::IDENT => {
            let word = p.nth_text(1);
            if options::is_statement_keyword(word) {
                code::statement(p, depth);
            } else if let Some(body) = p
                .options()
                .directive(word)
                .filter(|_| p.at_line_start())
                .map(|d| d.body)
            {
                directive(p, depth, body);
            } else {
                code::implicit_expression(p, depth);
            }
        }
        _ => invalid_transition(p),
    }
}

fn invalid_transition(p: &mut Parser<'_, '_>) {
    let m = p.start();
    let range = p.current_range();
    p.bump();
    let found = p.current_text().chars().next();
    p.error(SyntaxErrorKind::InvalidTransition { found }, range);
    m.complete(p, SyntaxKind::ERROR);
}

/// `@* ... *@`
pub(super) fn comment(p: &mut Parser<'_, '_>) {
    let m = p.start();
    let text = p.current_text();
    let range = p.current_range();
    p.bump();
    if text.len() < 4 || !text.ends_with("*@") {
        p.error(SyntaxErrorKind::UnterminatedComment, range);
    }
    m.complete(p, SyntaxKind::COMMENT);
}

/// `@:` inside code, markup up to the end of the line.
fn markup_line(p: &mut Parser<'_, '_>, depth: u16) {
    let m = p.start();
    p.bump(); // @
    p.bump(); // :
    markup::content(p, depth + 1);
    m.complete(p, SyntaxKind::MARKUP_LINE);
}

/// `@name tokens...` with an optional `{ ... }` body.
///
/// The header tokens stay flat inside `DIRECTIVE`; the body content, without
/// its braces, is wrapped in `DIRECTIVE_BODY`.
fn directive(p: &mut Parser<'_, '_>, depth: u16, body: DirectiveBody) {
    let inner = depth + 1;
    let m = p.start();
    p.bump(); // @
    let name = p.current_text().to_string();
    let name_range = p.current_range();

    while p.depth() == Some(inner) && !(body != DirectiveBody::None && p.at(SyntaxKind::L_BRACE)) {
        p.bump();
    }

    if body != DirectiveBody::None {
        if p.at_in(SyntaxKind::L_BRACE, inner) {
            let open = p.current_range();
            p.bump();
            let b = p.start();
            match body {
                DirectiveBody::Code => code::body(p, inner + 1),
                DirectiveBody::Markup => markup::content(p, inner + 1),
                DirectiveBody::None => {}
            }
            b.complete(p, SyntaxKind::DIRECTIVE_BODY);
            if !p.eat_in(SyntaxKind::R_BRACE, inner) {
                p.error(
                    SyntaxErrorKind::UnterminatedDirectiveBody { directive: name },
                    open,
                );
            }
        } else {
            p.error(
                SyntaxErrorKind::MissingDirectiveBody { directive: name },
                name_range,
            );
        }
    }
    m.complete(p, SyntaxKind::DIRECTIVE);
}
