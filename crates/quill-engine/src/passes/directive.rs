//! Directive-classifier passes. `DirectiveStructurePass` runs first and the
//! others assume the skeleton it leaves behind.

use std::collections::HashSet;

use super::{Pass, PassCategory, PassContext, PassError, Prerequisite};
use crate::diagnostics::codes;
use crate::ir::{IrNode, IrTree, NodeId, Symbol};

const AFTER_STRUCTURE: &[Prerequisite] = &[
    Prerequisite::Category(PassCategory::Lowering),
    Prerequisite::Pass("DirectiveStructurePass"),
];

/// The `Namespace`, `Class` and `Method` nodes lowering creates.
pub(super) fn skeleton(ir: &IrTree) -> Result<(NodeId, NodeId, NodeId), PassError> {
    match (ir.namespace(), ir.class(), ir.method()) {
        (Some(namespace), Some(class), Some(method)) => Ok((namespace, class, method)),
        _ => Err(PassError::Fatal(
            "the IR has no namespace/class/method skeleton".to_string(),
        )),
    }
}

/// Attached `Directive` nodes with one of `names`, in document order.
pub(super) fn directives(ir: &IrTree, names: &[&str]) -> Vec<NodeId> {
    ir.find_all(|n| matches!(n, IrNode::Directive { name, .. } if names.contains(&name.as_str())))
}

/// The `DirectiveToken` children of a directive as symbols.
pub(super) fn tokens(ir: &IrTree, directive: NodeId) -> Vec<Symbol> {
    ir.children(directive)
        .iter()
        .filter_map(|&id| match ir.node(id) {
            IrNode::DirectiveToken { text, .. } => Some(Symbol::new(text.clone(), ir.span(id).cloned())),
            _ => None,
        })
        .collect()
}

/// Children of a directive that are not its header tokens.
fn body(ir: &IrTree, directive: NodeId) -> Vec<NodeId> {
    ir.children(directive)
        .iter()
        .copied()
        .filter(|&id| !matches!(ir.node(id), IrNode::DirectiveToken { .. }))
        .collect()
}

fn directive_name(ir: &IrTree, id: NodeId) -> &str {
    match ir.node(id) {
        IrNode::Directive { name, .. } => name,
        _ => "",
    }
}

/// `using`, `inherits`, `model` and `namespace` become properties of the
/// skeleton. For singly-occurring ones the last occurrence wins, so the
/// document overrides its imports.
pub struct DirectiveStructurePass;

impl Pass for DirectiveStructurePass {
    fn name(&self) -> &'static str {
        "DirectiveStructurePass"
    }

    fn category(&self) -> PassCategory {
        PassCategory::DirectiveClassifier
    }

    fn order(&self) -> i32 {
        100
    }

    fn prerequisites(&self) -> &'static [Prerequisite] {
        &[Prerequisite::Category(PassCategory::Lowering)]
    }

    fn execute(&self, ctx: &mut PassContext<'_>) -> Result<(), PassError> {
        let ir = &mut *ctx.ir;
        let (namespace, class, _) = skeleton(ir)?;
        let mut usings = ir
            .children(namespace)
            .iter()
            .filter_map(|&id| match ir.node(id) {
                IrNode::Using { namespace } => Some(namespace.text.clone()),
                _ => None,
            })
            .collect::<HashSet<_>>();

        for id in directives(ir, &["using", "inherits", "model", "namespace"]) {
            let name = directive_name(ir, id).to_string();
            let Some(token) = tokens(ir, id).into_iter().next() else {
                continue;
            };
            match name.as_str() {
                "using" => {
                    if usings.insert(token.text.clone()) {
                        let index = ir.index_in_parent(class).unwrap_or(0);
                        let span = ir.span(id).cloned();
                        ir.insert(namespace, index, IrNode::Using { namespace: token }, span);
                    }
                }
                "inherits" => {
                    if let IrNode::Class { base_type, .. } = ir.node_mut(class) {
                        *base_type = Some(token);
                    }
                }
                "model" => {
                    if let IrNode::Class { model, .. } = ir.node_mut(class) {
                        *model = Some(token);
                    }
                }
                _ => {
                    if let IrNode::Namespace { name } = ir.node_mut(namespace) {
                        *name = Some(token);
                    }
                }
            }
            log::trace!("structured @{name} directive");
            ir.detach(id);
        }
        Ok(())
    }
}

/// `functions` and `code` bodies become class members.
pub struct FunctionsDirectivePass;

impl Pass for FunctionsDirectivePass {
    fn name(&self) -> &'static str {
        "FunctionsDirectivePass"
    }

    fn category(&self) -> PassCategory {
        PassCategory::DirectiveClassifier
    }

    fn order(&self) -> i32 {
        200
    }

    fn prerequisites(&self) -> &'static [Prerequisite] {
        AFTER_STRUCTURE
    }

    fn execute(&self, ctx: &mut PassContext<'_>) -> Result<(), PassError> {
        let ir = &mut *ctx.ir;
        let (_, class, method) = skeleton(ir)?;
        for id in directives(ir, &["functions", "code"]) {
            for member in body(ir, id) {
                let index = ir.index_in_parent(method).unwrap_or(0);
                ir.attach(class, Some(index), member);
            }
            ir.detach(id);
        }
        Ok(())
    }
}

/// `@inject Type Member` becomes a class property.
pub struct InjectDirectivePass;

impl Pass for InjectDirectivePass {
    fn name(&self) -> &'static str {
        "InjectDirectivePass"
    }

    fn category(&self) -> PassCategory {
        PassCategory::DirectiveClassifier
    }

    fn order(&self) -> i32 {
        300
    }

    fn prerequisites(&self) -> &'static [Prerequisite] {
        AFTER_STRUCTURE
    }

    fn execute(&self, ctx: &mut PassContext<'_>) -> Result<(), PassError> {
        let ir = &mut *ctx.ir;
        let (_, class, method) = skeleton(ir)?;
        for id in directives(ir, &["inject"]) {
            let mut tokens = tokens(ir, id).into_iter();
            let (Some(type_name), Some(member)) = (tokens.next(), tokens.next()) else {
                continue;
            };
            let index = ir.index_in_parent(method).unwrap_or(0);
            let span = ir.span(id).cloned();
            ir.insert(class, index, IrNode::Property { type_name, member }, span);
            ir.detach(id);
        }
        Ok(())
    }
}

/// `@section Name { ... }` becomes a `Section` node in place of the
/// directive. A section without a body fails the whole pass.
pub struct SectionDirectivePass;

impl Pass for SectionDirectivePass {
    fn name(&self) -> &'static str {
        "SectionDirectivePass"
    }

    fn category(&self) -> PassCategory {
        PassCategory::DirectiveClassifier
    }

    fn order(&self) -> i32 {
        400
    }

    fn prerequisites(&self) -> &'static [Prerequisite] {
        AFTER_STRUCTURE
    }

    fn execute(&self, ctx: &mut PassContext<'_>) -> Result<(), PassError> {
        let mut defined = HashSet::new();
        for id in directives(ctx.ir, &["section"]) {
            let Some(name) = tokens(ctx.ir, id).into_iter().next() else {
                continue;
            };
            let span = ctx
                .ir
                .span(id)
                .cloned()
                .unwrap_or_else(|| ctx.source.clamped_span(0..0));
            let has_body = matches!(ctx.ir.node(id), IrNode::Directive { has_body: true, .. });
            if !has_body {
                return Err(PassError::Recoverable(
                    codes::SECTION_MISSING_BODY.create(span, [name.text.as_str()]),
                ));
            }
            if !defined.insert(name.text.clone()) {
                ctx.diagnostics
                    .push(codes::DUPLICATE_SECTION.create(span.clone(), [name.text.as_str()]));
            }

            let (Some(parent), Some(index)) = (ctx.ir.parent(id), ctx.ir.index_in_parent(id))
            else {
                continue;
            };
            let content = body(ctx.ir, id);
            let section = ctx
                .ir
                .insert(parent, index, IrNode::Section { name }, Some(span));
            for child in content {
                ctx.ir.attach(section, None, child);
            }
            ctx.ir.detach(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::tests::{Harness, run_through};
    use pretty_assertions::assert_eq;

    #[test]
    fn structure_pass_collects_usings_and_types() {
        let harness = Harness::new("@using System.Linq\n@inherits Page\n@model Cart\n@namespace Shop\n<p></p>");
        let ir = run_through(&harness, &["DirectiveStructurePass"]);
        let namespace = ir.namespace().expect("namespace");
        let class = ir.class().expect("class");
        assert_eq!(
            ir.node(class),
            &IrNode::Class {
                name: String::new(),
                base_type: Some(Symbol::new("Page", Some(harness.source.clamped_span(29..33)))),
                model: Some(Symbol::new("Cart", Some(harness.source.clamped_span(41..45)))),
            }
        );
        let IrNode::Namespace { name } = ir.node(namespace) else {
            unreachable!()
        };
        assert_eq!(name.as_ref().map(|n| n.text.as_str()), Some("Shop"));
        let kinds = ir
            .children(namespace)
            .iter()
            .map(|&id| ir.node(id).kind_name())
            .collect::<Vec<_>>();
        assert_eq!(kinds, vec!["Using", "Class"]);
        assert!(ir.find(|n| matches!(n, IrNode::Directive { .. })).is_none());
    }

    #[test]
    fn document_overrides_import() {
        let harness = Harness::with_imports("@inherits Page\n", &["@inherits ImportedPage\n"]);
        let ir = run_through(&harness, &["DirectiveStructurePass"]);
        let class = ir.class().expect("class");
        let IrNode::Class { base_type, .. } = ir.node(class) else {
            unreachable!()
        };
        let base_type = base_type.as_ref().expect("base type");
        assert_eq!(base_type.text, "Page");
        assert_eq!(base_type.span.as_ref().map(|s| s.range()), Some(10..14));
    }

    #[test]
    fn duplicate_usings_collapse() {
        let harness = Harness::with_imports("@using System\n", &["@using System\n"]);
        let ir = run_through(&harness, &["DirectiveStructurePass"]);
        assert_eq!(ir.find_all(|n| matches!(n, IrNode::Using { .. })).len(), 1);
    }

    #[test]
    fn functions_body_moves_into_class() {
        let harness = Harness::new("@functions {\n  int Count;\n}\n<p></p>");
        let ir = run_through(
            &harness,
            &["DirectiveStructurePass", "FunctionsDirectivePass"],
        );
        let class = ir.class().expect("class");
        let kinds = ir
            .children(class)
            .iter()
            .map(|&id| ir.node(id).kind_name())
            .collect::<Vec<_>>();
        assert_eq!(kinds, vec!["HostCode", "Method"]);
        assert!(ir.find(|n| matches!(n, IrNode::Directive { .. })).is_none());
    }

    #[test]
    fn inject_creates_property() {
        let harness = Harness::new("@inject ILogger Logger\n");
        let ir = run_through(&harness, &["DirectiveStructurePass", "InjectDirectivePass"]);
        let property = ir
            .find(|n| matches!(n, IrNode::Property { .. }))
            .expect("property");
        let IrNode::Property { type_name, member } = ir.node(property) else {
            unreachable!()
        };
        assert_eq!((type_name.text.as_str(), member.text.as_str()), ("ILogger", "Logger"));
        assert_eq!(ir.parent(property), ir.class());
    }

    #[test]
    fn section_replaces_directive() {
        let harness = Harness::new("<p></p>\n@section Scripts {\n<b></b>\n}\n");
        let ir = run_through(&harness, &["DirectiveStructurePass", "SectionDirectivePass"]);
        let section = ir
            .find(|n| matches!(n, IrNode::Section { .. }))
            .expect("section");
        assert_eq!(ir.parent(section), ir.method());
        assert!(
            ir.children(section)
                .iter()
                .all(|&id| matches!(ir.node(id), IrNode::MarkupContent { .. }))
        );
        assert!(harness.diagnostics().is_empty());
    }

    #[test]
    fn duplicate_section_warns() {
        let harness = Harness::new("@section A {\n}\n@section A {\n}\n");
        run_through(&harness, &["DirectiveStructurePass", "SectionDirectivePass"]);
        let ids = harness.diagnostics().iter().map(|d| d.id).collect::<Vec<_>>();
        assert_eq!(ids, vec!["QL2008"]);
    }
}
