//! Recoverable syntax errors collected while parsing.
//!
//! The parser never fails: each malformed construct adds one error and the
//! tree is still built over every byte.

use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// `@{` without its closing `}`
    UnterminatedCodeBlock,
    /// `@(` without its closing `)`
    UnterminatedExplicitExpression,
    /// `@*` without `*@`
    UnterminatedComment,
    /// String or character literal without a closing quote
    UnterminatedString,
    /// An opening delimiter inside host code that is never closed
    UnclosedDelimiter { open: char },
    /// A closing delimiter inside host code with no matching opener
    UnexpectedDelimiter { close: char },
    /// `@` followed by something that cannot start a construct
    InvalidTransition { found: Option<char> },
    /// `@if (...)` etc. with no `{` body
    ExpectedStatementBlock { keyword: String },
    /// A block directive whose `{` never appears
    MissingDirectiveBody { directive: String },
    /// A block directive whose body is never closed
    UnterminatedDirectiveBody { directive: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    /// Byte range in the parsed source.
    pub range: Range<usize>,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, range: Range<usize>) -> Self {
        Self { kind, range }
    }
}
