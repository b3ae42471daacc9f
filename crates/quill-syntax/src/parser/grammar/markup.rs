//! Markup grammar rules.

use crate::parser::Parser;
use crate::syntax_kind::SyntaxKind;

use super::template;

/// Markup at `depth` up to the first shallower token.
pub(super) fn content(p: &mut Parser<'_, '_>, depth: u16) {
    while let Some(current) = p.depth() {
        if current < depth {
            break;
        }
        if current > depth {
            stray(p, depth);
            continue;
        }
        match p.current() {
            SyntaxKind::TRANSITION => template::transition(p, depth),
            SyntaxKind::TEMPLATE_COMMENT => template::comment(p),
            _ => block(p, depth),
        }
    }
}

/// Deeper tokens with no owning construct. The lexer never produces these
/// in markup, but the tree must still cover them.
fn stray(p: &mut Parser<'_, '_>, depth: u16) {
    let m = p.start();
    while p.deeper_than(depth) {
        p.bump();
    }
    m.complete(p, SyntaxKind::ERROR);
}

/// A run of markup tokens, stopping at the next transition or comment.
fn block(p: &mut Parser<'_, '_>, depth: u16) {
    let m = p.start();
    while p.depth() == Some(depth)
        && !p.at(SyntaxKind::TRANSITION)
        && !p.at(SyntaxKind::TEMPLATE_COMMENT)
    {
        match p.current() {
            SyntaxKind::LT if p.nth(1) == SyntaxKind::TEXT && p.nth_depth(1) == Some(depth) => {
                start_tag(p, depth)
            }
            SyntaxKind::LT_SLASH => end_tag(p, depth),
            _ => p.bump(),
        }
    }
    m.complete(p, SyntaxKind::MARKUP_BLOCK);
}

fn start_tag(p: &mut Parser<'_, '_>, depth: u16) {
    let m = p.start();
    p.bump(); // <
    p.bump(); // name
    while p.depth() == Some(depth) {
        match p.current() {
            SyntaxKind::GT | SyntaxKind::SLASH_GT => {
                p.bump();
                break;
            }
            // a new tag starts before this one closed
            SyntaxKind::LT | SyntaxKind::LT_SLASH => break,
            SyntaxKind::TEXT => attribute(p, depth),
            SyntaxKind::TRANSITION => template::transition(p, depth),
            _ => p.bump(),
        }
    }
    m.complete(p, SyntaxKind::MARKUP_START_TAG);
}

fn end_tag(p: &mut Parser<'_, '_>, depth: u16) {
    let m = p.start();
    p.bump(); // </
    while p.depth() == Some(depth)
        && !matches!(
            p.current(),
            SyntaxKind::GT | SyntaxKind::LT | SyntaxKind::LT_SLASH | SyntaxKind::TRANSITION
        )
    {
        p.bump();
    }
    if p.depth() == Some(depth) {
        p.eat(SyntaxKind::GT);
    }
    m.complete(p, SyntaxKind::MARKUP_END_TAG);
}

fn attribute(p: &mut Parser<'_, '_>, depth: u16) {
    let m = p.start();
    p.bump(); // name
    if p.at_in(SyntaxKind::EQ, depth) {
        p.bump();
        attribute_value(p, depth);
    }
    m.complete(p, SyntaxKind::MARKUP_ATTRIBUTE);
}

fn attribute_value(p: &mut Parser<'_, '_>, depth: u16) {
    let m = p.start();
    match p.current() {
        quote @ (SyntaxKind::DQUOTE | SyntaxKind::SQUOTE) => {
            p.bump();
            while p.depth() == Some(depth) && !p.at(quote) {
                match p.current() {
                    SyntaxKind::TRANSITION => template::transition(p, depth),
                    _ => p.bump(),
                }
            }
            if p.depth() == Some(depth) {
                p.eat(quote);
            }
        }
        SyntaxKind::TRANSITION => template::transition(p, depth),
        SyntaxKind::TEXT => p.bump(),
        _ => {}
    }
    m.complete(p, SyntaxKind::MARKUP_ATTRIBUTE_VALUE);
}
