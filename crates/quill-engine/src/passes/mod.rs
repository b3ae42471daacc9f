//! # Pass Pipeline
//!
//! Passes run in a fixed category order, and by ascending `order` within a
//! category:
//!
//! ```text
//! SyntaxTree → Lowering → DirectiveClassifier → Optimization → DocumentClassifier
//! ```
//!
//! A [`Pipeline`] is validated when it is built: pass names are unique, and
//! every prerequisite is registered before the pass that needs it and never
//! belongs to a later category. A broken pipeline is a configuration error,
//! not a per-document diagnostic.
//!
//! At run time a pass that returns [`PassError::Recoverable`] has its own
//! changes rolled back and its diagnostic recorded; later passes continue.
//! [`PassError::Fatal`] aborts the compilation.

mod directive;
mod document;
mod lowering;
mod optimization;
mod syntax_tree;

pub use directive::{
    DirectiveStructurePass, FunctionsDirectivePass, InjectDirectivePass, SectionDirectivePass,
};
pub use document::DefaultDocumentClassifierPass;
pub use lowering::LoweringPass;
pub use optimization::{DesignTimeDirectivePass, EliminateEmptyNodesPass, MergeMarkupPass};
pub use syntax_tree::DirectivePlacementPass;

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::diagnostics::Diagnostic;
use crate::document::{CancellationToken, CompileOptions};
use crate::error::CompileError;
use crate::ir::IrTree;
use crate::source::SourceText;
use crate::syntax::SyntaxTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PassCategory {
    SyntaxTree,
    Lowering,
    DirectiveClassifier,
    Optimization,
    DocumentClassifier,
}

/// Something a pass needs to have run before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prerequisite {
    /// At least one pass of this category.
    Category(PassCategory),
    /// The pass with this name.
    Pass(&'static str),
}

/// Everything a pass may read, plus the IR and diagnostics it may change.
pub struct PassContext<'a> {
    pub source: &'a SourceText,
    pub syntax_tree: &'a SyntaxTree,
    pub imports: &'a [SyntaxTree],
    pub options: &'a CompileOptions,
    pub ir: &'a mut IrTree,
    pub diagnostics: &'a mut Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassError {
    /// The input was unusable for this pass; its changes are dropped.
    Recoverable(Diagnostic),
    /// A broken invariant inside the compiler.
    Fatal(String),
}

pub trait Pass: Send + Sync {
    fn name(&self) -> &'static str;

    fn category(&self) -> PassCategory;

    /// Position within the category, ascending.
    fn order(&self) -> i32;

    fn prerequisites(&self) -> &'static [Prerequisite] {
        &[]
    }

    fn execute(&self, ctx: &mut PassContext<'_>) -> Result<(), PassError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("pass `{0}` is registered more than once")]
    DuplicatePass(&'static str),
    #[error("pass `{pass}` requires {prerequisite}, which is not registered before it")]
    MissingPrerequisite {
        pass: &'static str,
        prerequisite: String,
    },
    #[error("pass `{pass}` ({category:?}) cannot depend on the later {prerequisite}")]
    PrerequisiteRunsLater {
        pass: &'static str,
        category: PassCategory,
        prerequisite: String,
    },
}

fn describe(prerequisite: Prerequisite) -> String {
    match prerequisite {
        Prerequisite::Category(category) => format!("{category:?} category"),
        Prerequisite::Pass(name) => format!("pass `{name}`"),
    }
}

/// A validated, ordered set of passes. Immutable and shareable across
/// compilations.
pub struct Pipeline {
    passes: Vec<Box<dyn Pass>>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.passes.iter().map(|p| p.name()))
            .finish()
    }
}

impl Pipeline {
    /// Validates `passes` in registration order, then sorts them into run
    /// order.
    pub fn new(passes: Vec<Box<dyn Pass>>) -> Result<Self, PipelineError> {
        let mut seen: HashMap<&'static str, PassCategory> = HashMap::new();
        for pass in &passes {
            let category = pass.category();
            for &prerequisite in pass.prerequisites() {
                let required = match prerequisite {
                    Prerequisite::Category(required) => {
                        seen.values().any(|&c| c == required).then_some(required)
                    }
                    Prerequisite::Pass(name) => seen.get(name).copied(),
                };
                match required {
                    None => {
                        return Err(PipelineError::MissingPrerequisite {
                            pass: pass.name(),
                            prerequisite: describe(prerequisite),
                        });
                    }
                    Some(required) if required > category => {
                        return Err(PipelineError::PrerequisiteRunsLater {
                            pass: pass.name(),
                            category,
                            prerequisite: describe(prerequisite),
                        });
                    }
                    Some(_) => {}
                }
            }
            if seen.insert(pass.name(), category).is_some() {
                return Err(PipelineError::DuplicatePass(pass.name()));
            }
        }
        Ok(Self::sorted(passes))
    }

    /// The built-in passes.
    pub fn builtin() -> Self {
        Self::sorted(builtin_passes())
    }

    fn sorted(mut passes: Vec<Box<dyn Pass>>) -> Self {
        passes.sort_by_key(|p| (p.category(), p.order()));
        Self { passes }
    }

    /// Pass names in run order.
    pub fn names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Runs every pass, checking `cancel` before each one.
    pub fn run(
        &self,
        ctx: &mut PassContext<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), CompileError> {
        for pass in &self.passes {
            cancel.check()?;
            run_pass(pass.as_ref(), ctx)?;
        }
        Ok(())
    }

    /// Runs only the passes of one category.
    pub fn run_category(
        &self,
        category: PassCategory,
        ctx: &mut PassContext<'_>,
    ) -> Result<(), CompileError> {
        for pass in self.passes.iter().filter(|p| p.category() == category) {
            run_pass(pass.as_ref(), ctx)?;
        }
        Ok(())
    }
}

fn run_pass(pass: &dyn Pass, ctx: &mut PassContext<'_>) -> Result<(), CompileError> {
    log::debug!("running pass {} ({:?})", pass.name(), pass.category());
    let snapshot = ctx.ir.clone();
    let diagnostics = ctx.diagnostics.len();
    match pass.execute(ctx) {
        Ok(()) => Ok(()),
        Err(PassError::Recoverable(diagnostic)) => {
            log::warn!("pass {} skipped: {}", pass.name(), diagnostic);
            *ctx.ir = snapshot;
            ctx.diagnostics.truncate(diagnostics);
            ctx.diagnostics.push(diagnostic);
            Ok(())
        }
        Err(PassError::Fatal(message)) => Err(CompileError::Pass {
            pass: pass.name(),
            message,
        }),
    }
}

/// The built-in passes in registration order.
pub fn builtin_passes() -> Vec<Box<dyn Pass>> {
    vec![
        Box::new(DirectivePlacementPass),
        Box::new(LoweringPass),
        Box::new(DirectiveStructurePass),
        Box::new(FunctionsDirectivePass),
        Box::new(InjectDirectivePass),
        Box::new(SectionDirectivePass),
        Box::new(EliminateEmptyNodesPass),
        Box::new(MergeMarkupPass),
        Box::new(DesignTimeDirectivePass),
        Box::new(DefaultDocumentClassifierPass),
    ]
}
