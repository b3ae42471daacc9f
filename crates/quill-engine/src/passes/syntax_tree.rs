use std::collections::HashSet;

use quill_syntax::{SyntaxKind, SyntaxNode};

use super::{Pass, PassCategory, PassContext, PassError};
use crate::diagnostics::codes;
use crate::directives::{DirectiveRegistry, DirectiveUsage};
use crate::syntax::SyntaxTree;

/// Checks where directives appear: file-scoped directives only at the top
/// level, singly-occurring ones once per file, and no section inside another.
pub struct DirectivePlacementPass;

impl Pass for DirectivePlacementPass {
    fn name(&self) -> &'static str {
        "DirectivePlacementPass"
    }

    fn category(&self) -> PassCategory {
        PassCategory::SyntaxTree
    }

    fn order(&self) -> i32 {
        100
    }

    fn execute(&self, ctx: &mut PassContext<'_>) -> Result<(), PassError> {
        let registry = &ctx.options.directives;
        for tree in ctx.imports.iter().chain(std::iter::once(ctx.syntax_tree)) {
            check_tree(tree, registry, ctx.diagnostics);
        }
        Ok(())
    }
}

fn check_tree(
    tree: &SyntaxTree,
    registry: &DirectiveRegistry,
    diagnostics: &mut Vec<crate::diagnostics::Diagnostic>,
) {
    let mut seen = HashSet::new();
    for directive in tree
        .root()
        .descendants()
        .filter(|n| n.kind() == SyntaxKind::DIRECTIVE)
    {
        let Some(name_token) = directive
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| t.kind() == SyntaxKind::IDENT)
        else {
            continue;
        };
        let name = name_token.text();
        let Some(descriptor) = registry.get(name) else {
            continue;
        };
        let span = tree.span(name_token.text_range());
        let top_level = directive.parent().map(|p| p.kind()) == Some(SyntaxKind::ROOT);

        if descriptor.usage.is_file_scoped() && !top_level {
            diagnostics.push(codes::DIRECTIVE_NOT_FILE_SCOPED.create(span.clone(), [name]));
        }
        if descriptor.usage == DirectiveUsage::FileScopedSinglyOccurring
            && !seen.insert(name.to_string())
        {
            diagnostics.push(codes::DUPLICATE_DIRECTIVE.create(span.clone(), [name]));
        }
        if name == "section" && inside_section(&directive) {
            let section_name = section_name(&directive).unwrap_or_default();
            diagnostics.push(codes::NESTED_SECTION.create(span, [section_name]));
        }
    }
}

fn directive_name(node: &SyntaxNode) -> Option<String> {
    node.children_with_tokens()
        .filter_map(|e| e.into_token())
        .find(|t| t.kind() == SyntaxKind::IDENT)
        .map(|t| t.text().to_string())
}

fn inside_section(node: &SyntaxNode) -> bool {
    node.ancestors()
        .skip(1)
        .filter(|n| n.kind() == SyntaxKind::DIRECTIVE)
        .any(|n| directive_name(&n).as_deref() == Some("section"))
}

/// The first header word after `section`.
fn section_name(node: &SyntaxNode) -> Option<String> {
    node.children_with_tokens()
        .filter_map(|e| e.into_token())
        .filter(|t| t.kind() == SyntaxKind::IDENT)
        .nth(1)
        .map(|t| t.text().to_string())
}
