//! # Code Documents
//!
//! [`create_code_document`] is the single compilation entry point:
//!
//! ```text
//! parse (imports + document) → pass pipeline → host / markup writers
//! ```
//!
//! A [`CodeDocument`] is built once and never changes afterwards; an edited
//! template is compiled into a new document. Everything it holds is owned,
//! so completed documents can be shared across threads and queried
//! concurrently.
//!
//! ## Usage
//!
//! ```rust
//! # use quill_engine::{CompileOptions, SourceText, TargetKind, create_code_document};
//! let source = SourceText::with_path("Pages/Index.qtml", "<p>@name</p>");
//! let document = create_code_document(source, Vec::new(), &CompileOptions::default()).unwrap();
//! assert!(!document.has_errors());
//! assert!(document.generated_document(TargetKind::Host).text().text().contains("Write(name);"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::codegen::{GeneratedDocument, TargetKind, generate};
use crate::diagnostics::Diagnostic;
use crate::directives::DirectiveRegistry;
use crate::error::CompileError;
use crate::ir::IrTree;
use crate::passes::{PassContext, Pipeline};
use crate::source::SourceText;
use crate::syntax::SyntaxTree;

pub const DEFAULT_ROOT_NAMESPACE: &str = "Quill";
pub const DEFAULT_BASE_TYPE: &str = "global::Quill.TemplateBase";

/// Read-only inputs shared by every compilation. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub directives: Arc<DirectiveRegistry>,
    /// Namespace prefix for classes whose template sets none.
    pub root_namespace: String,
    /// Base class for templates without `@inherits`.
    pub base_type: String,
    /// Keep unconsumed directive tokens as design-time helpers.
    pub design_time: bool,
    pub pipeline: Arc<Pipeline>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            directives: Arc::new(DirectiveRegistry::builtin()),
            root_namespace: DEFAULT_ROOT_NAMESPACE.to_string(),
            base_type: DEFAULT_BASE_TYPE.to_string(),
            design_time: true,
            pipeline: Arc::new(Pipeline::builtin()),
        }
    }
}

/// Cooperative cancellation flag, checked between stages and passes.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn check(&self) -> Result<(), CompileError> {
        if self.is_cancelled() {
            Err(CompileError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// One compiled template.
#[derive(Debug, Clone)]
pub struct CodeDocument {
    source: SourceText,
    imports: Vec<SourceText>,
    syntax_tree: SyntaxTree,
    import_trees: Vec<SyntaxTree>,
    ir: IrTree,
    host: GeneratedDocument,
    markup: GeneratedDocument,
    diagnostics: Vec<Diagnostic>,
}

impl CodeDocument {
    pub fn source(&self) -> &SourceText {
        &self.source
    }

    /// Import texts, least specific first.
    pub fn imports(&self) -> &[SourceText] {
        &self.imports
    }

    pub fn syntax_tree(&self) -> &SyntaxTree {
        &self.syntax_tree
    }

    pub fn import_trees(&self) -> &[SyntaxTree] {
        &self.import_trees
    }

    pub fn ir(&self) -> &IrTree {
        &self.ir
    }

    pub fn generated_document(&self, kind: TargetKind) -> &GeneratedDocument {
        match kind {
            TargetKind::Host => &self.host,
            TargetKind::Markup => &self.markup,
        }
    }

    /// Syntax diagnostics of the imports and the document, then everything
    /// lowering and the passes reported.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

pub fn create_code_document(
    source: SourceText,
    imports: Vec<SourceText>,
    options: &CompileOptions,
) -> Result<CodeDocument, CompileError> {
    create_code_document_with_cancellation(source, imports, options, &CancellationToken::new())
}

pub fn create_code_document_with_cancellation(
    source: SourceText,
    imports: Vec<SourceText>,
    options: &CompileOptions,
    cancel: &CancellationToken,
) -> Result<CodeDocument, CompileError> {
    let parse_options = options.directives.parse_options();
    let import_trees = imports
        .iter()
        .map(|import| SyntaxTree::parse(import, &parse_options))
        .collect::<Vec<_>>();
    let syntax_tree = SyntaxTree::parse(&source, &parse_options);
    cancel.check()?;

    let mut diagnostics = import_trees
        .iter()
        .chain(std::iter::once(&syntax_tree))
        .flat_map(|tree| tree.diagnostics().iter().cloned())
        .collect::<Vec<_>>();

    let mut ir = IrTree::new();
    options.pipeline.run(
        &mut PassContext {
            source: &source,
            syntax_tree: &syntax_tree,
            imports: &import_trees,
            options,
            ir: &mut ir,
            diagnostics: &mut diagnostics,
        },
        cancel,
    )?;
    cancel.check()?;

    let host = generate(&source, &ir, TargetKind::Host)?;
    let markup = generate(&source, &ir, TargetKind::Markup)?;
    diagnostics.extend(host.diagnostics().iter().cloned());
    diagnostics.extend(markup.diagnostics().iter().cloned());
    log::debug!(
        "compiled {} ({} diagnostics, {} host / {} markup mappings)",
        source.path().unwrap_or("<memory>"),
        diagnostics.len(),
        host.mappings().len(),
        markup.mappings().len()
    );

    Ok(CodeDocument {
        source,
        imports,
        syntax_tree,
        import_trees,
        ir,
        host,
        markup,
        diagnostics,
    })
}

/// A document and its imports, least specific first.
#[derive(Debug, Clone)]
pub struct CompileInput {
    pub source: SourceText,
    pub imports: Vec<SourceText>,
}

/// Compiles independent documents in parallel. Results keep input order.
pub fn compile_all(
    inputs: &[CompileInput],
    options: &CompileOptions,
) -> Vec<Result<CodeDocument, CompileError>> {
    if inputs.is_empty() {
        return Vec::new();
    }
    let workers = thread::available_parallelism().map_or(1, |n| n.get());
    let chunk_size = inputs.len().div_ceil(workers);

    thread::scope(|scope| {
        let handles = inputs
            .chunks(chunk_size)
            .map(|chunk| {
                let handle = scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|input| {
                            create_code_document(input.source.clone(), input.imports.clone(), options)
                        })
                        .collect::<Vec<_>>()
                });
                (chunk.len(), handle)
            })
            .collect::<Vec<_>>();

        handles
            .into_iter()
            .flat_map(|(len, handle)| {
                handle.join().unwrap_or_else(|_| {
                    log::warn!("compilation worker panicked");
                    (0..len).map(|_| Err(CompileError::WorkerPanicked)).collect()
                })
            })
            .collect()
    })
}
