//! # quill-engine
//!
//! Compiles quill templates into a host-language class and a markup
//! projection, each with a table mapping generated ranges back to the
//! template.
//!
//! - [`source`]: immutable template text with offset/line arithmetic.
//! - [`syntax`]: the lossless syntax tree from `quill-syntax`.
//! - [`ir`]: the mutable intermediate tree passes work on.
//! - [`passes`]: the ordered, validated pass pipeline.
//! - [`codegen`]: host and markup writers with source mappings.
//! - [`document`]: [`create_code_document`], the compilation entry point.
//! - [`mapping`]: range translation and language classification.

pub mod codegen;
pub mod diagnostics;
pub mod directives;
pub mod document;
pub mod error;
pub mod io;
pub mod ir;
pub mod lowering;
pub mod mapping;
pub mod passes;
pub mod snapshot;
pub mod source;
pub mod syntax;

// Re-export key types for easier usage
pub use codegen::{GeneratedDocument, SourceMapping, TargetKind};
pub use diagnostics::{Diagnostic, DiagnosticDescriptor, Severity, codes};
pub use directives::{
    DirectiveDescriptor, DirectiveKind, DirectiveRegistry, DirectiveTokenDescriptor,
    DirectiveTokenKind, DirectiveUsage,
};
pub use document::{
    CancellationToken, CodeDocument, CompileInput, CompileOptions, compile_all,
    create_code_document, create_code_document_with_cancellation,
};
pub use error::CompileError;
pub use io::*;
pub use ir::{IrNode, IrTree, NodeId, Symbol};
pub use mapping::{DefaultDocumentMappingService, DocumentMappingService, LanguageKind};
pub use passes::{
    Pass, PassCategory, PassContext, PassError, Pipeline, PipelineError, Prerequisite,
    builtin_passes,
};
pub use source::{SourceError, SourceLocation, SourceSpan, SourceText};
pub use syntax::SyntaxTree;
