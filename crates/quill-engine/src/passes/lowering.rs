use super::{Pass, PassCategory, PassContext, PassError};
use crate::lowering::lower;

/// Builds the IR from the syntax tree and its imports.
pub struct LoweringPass;

impl Pass for LoweringPass {
    fn name(&self) -> &'static str {
        "LoweringPass"
    }

    fn category(&self) -> PassCategory {
        PassCategory::Lowering
    }

    fn order(&self) -> i32 {
        0
    }

    fn execute(&self, ctx: &mut PassContext<'_>) -> Result<(), PassError> {
        if !ctx.ir.children(ctx.ir.root()).is_empty() {
            return Err(PassError::Fatal("the IR was already lowered".to_string()));
        }
        lower(
            ctx.syntax_tree,
            ctx.imports,
            &ctx.options.directives,
            ctx.ir,
            ctx.diagnostics,
        );
        Ok(())
    }
}
