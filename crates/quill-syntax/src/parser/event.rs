//! # Parser Events
//!
//! The grammar does not build the tree directly. It appends to a flat list of
//! events which the [`Sink`](super::sink::Sink) replays into a Rowan green
//! tree:
//!
//! ```text
//! Start(CODE_BLOCK)
//!   Token(TRANSITION)
//!   Token(L_BRACE)
//!   Start(HOST_CODE)
//!     Token(IDENT)
//!   Finish
//!   Token(R_BRACE)
//! Finish
//! ```
//!
//! Every `Token` event consumes exactly one lexer token, so the sink can walk
//! the token slice in lockstep and the tree stays lossless.

use crate::syntax_kind::SyntaxKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Open a node.
    Start { kind: SyntaxKind },
    /// Attach the next lexer token to the open node.
    Token { kind: SyntaxKind },
    /// Close the most recently opened node.
    Finish,
    /// Reserved by `Parser::start`; replaced on completion, ignored if
    /// the marker was abandoned.
    Placeholder,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_distinct_from_start() {
        assert_ne!(
            Event::Placeholder,
            Event::Start {
                kind: SyntaxKind::ROOT
            }
        );
    }
}
