//! # quill-syntax
//!
//! A lossless syntax tree for `.qtml` templates using [Rowan] + [Logos],
//! following the [rust-analyzer] architecture model.
//!
//! [Rowan]: https://docs.rs/rowan
//! [Logos]: https://docs.rs/logos
//! [rust-analyzer]: https://rust-analyzer.github.io/book/contributing/syntax.html
//!
//! Templates mix two languages: HTML-like markup and a C#-like host
//! language, joined by `@` transitions. The tree keeps **every byte** of the
//! source, so concatenating the leaf tokens always reproduces the input even
//! when the template is half-typed and full of errors.
//!
//! ## Architecture Overview
//!
//! ```text
//! Source Text → Lexer → Tokens → Parser → Events → Sink → Rowan Tree
//!               (Logos +         (Grammar)        (GreenNodeBuilder)
//!                mode stack)
//! ```
//!
//! ### 1. Lexer ([`lexer`] module)
//!
//! One Logos tokenizer per language, switched by an explicit mode stack.
//! Each token records the stack depth it was produced at.
//!
//! ```text
//! "<p>@x</p>" → [LT, TEXT, GT, TRANSITION, IDENT(depth 1), LT_SLASH, TEXT, GT]
//! ```
//!
//! ### 2. Parser ([`parser`] module)
//!
//! The parser consumes tokens and emits **events**. Grammar rules decide
//! where a construct ends from the token depths, so they never repeat the
//! lexer's mode decisions. Malformed input produces [`SyntaxError`]s, never a
//! failure.
//!
//! ### 3. Sink ([`parser::sink`] module)
//!
//! Replays the events into a Rowan green tree. The green tree is immutable,
//! `Send + Sync` and cheap to clone.
//!
//! ## Module Structure
//!
//! ```text
//! quill-syntax/
//! ├── lib.rs           # This file - public API and tree tests
//! ├── syntax_kind.rs   # SyntaxKind enum (tokens + nodes) and Rowan integration
//! ├── options.rs       # Directive names and keyword tables
//! ├── lexer.rs         # Mode-stack tokenizer
//! ├── error.rs         # SyntaxError
//! ├── fixtures/        # .qtml inputs, one generated test each
//! └── parser/
//!     ├── mod.rs       # Parser struct, Marker system, parse()
//!     ├── event.rs     # Event enum
//!     ├── sink.rs      # Converts events to Rowan GreenNode
//!     └── grammar/     # markup, template and host code rules
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use quill_syntax::{parse, SyntaxKind};
//!
//! let parse = parse("<p>@name</p>");
//! let tree = parse.syntax_node();
//!
//! assert_eq!(tree.text().to_string(), "<p>@name</p>");
//! assert_eq!(tree.kind(), SyntaxKind::ROOT);
//! assert!(tree
//!     .children()
//!     .any(|n| n.kind() == SyntaxKind::IMPLICIT_EXPRESSION));
//! ```

pub mod error;
pub mod lexer;
pub mod options;
pub mod parser;
pub mod syntax_kind;

pub use error::{SyntaxError, SyntaxErrorKind};
pub use options::{DirectiveBody, DirectiveSyntax, ParseOptions};
pub use parser::{Parse, parse, parse_with_options};
pub use syntax_kind::{QuillLang, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};

pub use rowan::{TextRange, TextSize, TokenAtOffset};
