use super::directive::skeleton;
use super::{Pass, PassCategory, PassContext, PassError, Prerequisite};
use crate::ir::{IrNode, IrTree, NodeId};
use crate::source::SourceSpan;

const AFTER_LOWERING: &[Prerequisite] = &[Prerequisite::Category(PassCategory::Lowering)];

fn is_empty(node: &IrNode) -> bool {
    match node {
        IrNode::MarkupContent { text } => text.is_empty(),
        IrNode::HostCode { code } => code.is_empty(),
        IrNode::HostExpression { code } => code.trim().is_empty(),
        _ => false,
    }
}

/// Drops literals and code that would write nothing.
pub struct EliminateEmptyNodesPass;

impl Pass for EliminateEmptyNodesPass {
    fn name(&self) -> &'static str {
        "EliminateEmptyNodesPass"
    }

    fn category(&self) -> PassCategory {
        PassCategory::Optimization
    }

    fn order(&self) -> i32 {
        100
    }

    fn prerequisites(&self) -> &'static [Prerequisite] {
        AFTER_LOWERING
    }

    fn execute(&self, ctx: &mut PassContext<'_>) -> Result<(), PassError> {
        let empty = ctx.ir.find_all(is_empty);
        log::trace!("dropping {} empty nodes", empty.len());
        for id in empty {
            ctx.ir.detach(id);
        }
        Ok(())
    }
}

/// Joins sibling `MarkupContent` nodes whose spans touch and whose text is
/// exactly the source under the span. `@@` literals never merge, their text
/// is shorter than their span.
pub struct MergeMarkupPass;

fn literal(ir: &IrTree, id: NodeId) -> Option<(&str, &SourceSpan)> {
    match (ir.node(id), ir.span(id)) {
        (IrNode::MarkupContent { text }, Some(span)) if text.len() == span.length => {
            Some((text.as_str(), span))
        }
        _ => None,
    }
}

impl Pass for MergeMarkupPass {
    fn name(&self) -> &'static str {
        "MergeMarkupPass"
    }

    fn category(&self) -> PassCategory {
        PassCategory::Optimization
    }

    fn order(&self) -> i32 {
        200
    }

    fn prerequisites(&self) -> &'static [Prerequisite] {
        AFTER_LOWERING
    }

    fn execute(&self, ctx: &mut PassContext<'_>) -> Result<(), PassError> {
        let ir = &mut *ctx.ir;
        for parent in ir.descendants(ir.root()) {
            let mut previous: Option<NodeId> = None;
            for child in ir.children(parent).to_vec() {
                let merged = {
                    let tree: &IrTree = ir;
                    match (previous.and_then(|p| literal(tree, p)), literal(tree, child)) {
                        (Some((_, before)), Some((text, after)))
                            if before.end() == after.absolute_index =>
                        {
                            Some((text.to_string(), after.length))
                        }
                        _ => None,
                    }
                };
                match (previous, merged) {
                    (Some(target), Some((text, length))) => {
                        let data = ir.get_mut(target);
                        if let IrNode::MarkupContent { text: existing } = &mut data.node {
                            existing.push_str(&text);
                        }
                        if let Some(span) = &mut data.span {
                            span.length += length;
                        }
                        ir.detach(child);
                    }
                    _ => previous = Some(child),
                }
            }
        }
        Ok(())
    }
}

/// Moves the tokens of directives that no classifier consumed into the
/// class's `DesignTimeDirectives` node (or drops them when design-time
/// output is off), then splices each directive's body into its place.
pub struct DesignTimeDirectivePass;

impl Pass for DesignTimeDirectivePass {
    fn name(&self) -> &'static str {
        "DesignTimeDirectivePass"
    }

    fn category(&self) -> PassCategory {
        PassCategory::Optimization
    }

    fn order(&self) -> i32 {
        300
    }

    fn prerequisites(&self) -> &'static [Prerequisite] {
        &[Prerequisite::Category(PassCategory::DirectiveClassifier)]
    }

    fn execute(&self, ctx: &mut PassContext<'_>) -> Result<(), PassError> {
        let design_time = ctx.options.design_time;
        let ir = &mut *ctx.ir;
        let (_, class, _) = skeleton(ir)?;
        let remaining = ir.find_all(|n| matches!(n, IrNode::Directive { .. }));

        for directive in remaining {
            let tokens = ir
                .children(directive)
                .iter()
                .copied()
                .filter(|&id| matches!(ir.node(id), IrNode::DirectiveToken { .. }))
                .collect::<Vec<_>>();
            if design_time && !tokens.is_empty() {
                let helpers = design_time_node(ir, class);
                for token in tokens {
                    ir.attach(helpers, None, token);
                }
            } else {
                for token in tokens {
                    ir.detach(token);
                }
            }
            ir.unwrap_node(directive);
        }
        Ok(())
    }
}

fn design_time_node(ir: &mut IrTree, class: NodeId) -> NodeId {
    let existing = ir
        .children(class)
        .iter()
        .copied()
        .find(|&id| matches!(ir.node(id), IrNode::DesignTimeDirectives));
    existing.unwrap_or_else(|| ir.insert(class, 0, IrNode::DesignTimeDirectives, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::CompileOptions;
    use crate::passes::tests::{Harness, run_through};
    use pretty_assertions::assert_eq;

    fn literals(ir: &IrTree) -> Vec<(String, std::ops::Range<usize>)> {
        ir.find_all(|n| matches!(n, IrNode::MarkupContent { .. }))
            .into_iter()
            .filter_map(|id| match (ir.node(id), ir.span(id)) {
                (IrNode::MarkupContent { text }, Some(span)) => Some((text.clone(), span.range())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn empty_explicit_expression_is_dropped() {
        let harness = Harness::new("<p>@( )</p>");
        let ir = run_through(&harness, &["EliminateEmptyNodesPass"]);
        assert!(ir.find(|n| matches!(n, IrNode::HostExpression { .. })).is_none());
    }

    #[test]
    fn contiguous_markup_merges() {
        let harness = Harness::new("<ul><li>a</li></ul>@x<br/>");
        let ir = run_through(&harness, &["MergeMarkupPass"]);
        assert_eq!(
            literals(&ir),
            vec![
                ("<ul><li>a</li></ul>".to_string(), 0..19),
                ("<br/>".to_string(), 21..26),
            ]
        );
    }

    #[test]
    fn escaped_transition_stays_separate() {
        let harness = Harness::new("a @@b");
        let ir = run_through(&harness, &["MergeMarkupPass"]);
        assert_eq!(
            literals(&ir),
            vec![
                ("a ".to_string(), 0..2),
                ("@".to_string(), 2..4),
                ("b".to_string(), 4..5),
            ]
        );
    }

    #[test]
    fn merge_is_idempotent() {
        let harness = Harness::new("<p>one</p>\n<p>@two</p>\n");
        let once = run_through(&harness, &["MergeMarkupPass"]);
        let twice = run_through(&harness, &["MergeMarkupPass", "MergeMarkupPass"]);
        assert_eq!(once.dump(), twice.dump());
    }

    #[test]
    fn unconsumed_directive_tokens_become_design_time_helpers() {
        let harness = Harness::new("@model Cart\n<p></p>");
        let ir = run_through(&harness, &["DesignTimeDirectivePass"]);
        let class = ir.class().expect("class");
        let helpers = ir.children(class)[0];
        assert_eq!(ir.node(helpers), &IrNode::DesignTimeDirectives);
        assert_eq!(ir.children(helpers).len(), 1);
        assert!(ir.find(|n| matches!(n, IrNode::Directive { .. })).is_none());
    }

    #[test]
    fn design_time_off_drops_tokens() {
        let options = CompileOptions {
            design_time: false,
            ..CompileOptions::default()
        };
        let harness = Harness::with_options("@model Cart\n", &[], options);
        let ir = run_through(&harness, &["DesignTimeDirectivePass"]);
        assert!(ir.find(|n| matches!(n, IrNode::DesignTimeDirectives)).is_none());
        assert!(ir.find(|n| matches!(n, IrNode::DirectiveToken { .. })).is_none());
    }

    #[test]
    fn directive_body_is_spliced_in_place() {
        let harness = Harness::new("<p></p>\n@section S {<b></b>}\n<i></i>");
        let ir = run_through(&harness, &["DesignTimeDirectivePass", "MergeMarkupPass"]);
        let method = ir.method().expect("method");
        let text = ir
            .children(method)
            .iter()
            .map(|&id| match ir.node(id) {
                IrNode::MarkupContent { text } => text.as_str(),
                other => other.kind_name(),
            })
            .collect::<String>();
        assert_eq!(text, "<p></p>\n<b></b>\n<i></i>");
    }
}
