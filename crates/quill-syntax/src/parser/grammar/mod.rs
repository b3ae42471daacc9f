//! # Grammar Rules
//!
//! Each function takes a `&mut Parser` and a mode depth. Tokens at exactly
//! that depth belong to the rule; deeper tokens belong to a nested construct
//! and shallower ones end the rule.
//!
//! - [`markup`] - markup runs, tags, attributes
//! - [`template`] - transitions, directives, comments
//! - [`code`] - host code blocks, statements and expressions
//!
//! Rules are lenient: unexpected input is consumed into the current node or
//! wrapped in an `ERROR` node, and an error is recorded. Nothing is dropped.

mod code;
mod markup;
mod template;

use crate::parser::Parser;
use crate::syntax_kind::SyntaxKind;

/// Parse the root document.
pub fn root(p: &mut Parser<'_, '_>) {
    let m = p.start();
    markup::content(p, 0);
    m.complete(p, SyntaxKind::ROOT);
}
