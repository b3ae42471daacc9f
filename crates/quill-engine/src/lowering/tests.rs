use pretty_assertions::assert_eq;

use super::lower;
use crate::diagnostics::Diagnostic;
use crate::directives::{DirectiveRegistry, DirectiveTokenKind};
use crate::ir::{IrNode, IrTree};
use crate::source::SourceText;
use crate::syntax::SyntaxTree;

fn lower_with_imports(text: &str, imports: &[&str]) -> (IrTree, Vec<Diagnostic>) {
    let registry = DirectiveRegistry::builtin();
    let options = registry.parse_options();
    let tree = SyntaxTree::parse(&SourceText::with_path("Index.qtml", text), &options);
    let imports = imports
        .iter()
        .map(|text| SyntaxTree::parse(&SourceText::with_path("_Imports.qtml", text), &options))
        .collect::<Vec<_>>();
    let mut ir = IrTree::new();
    let mut diagnostics = Vec::new();
    lower(&tree, &imports, &registry, &mut ir, &mut diagnostics);
    (ir, diagnostics)
}

fn lower_text(text: &str) -> (IrTree, Vec<Diagnostic>) {
    lower_with_imports(text, &[])
}

#[test]
fn markup_and_expression() {
    let (ir, diagnostics) = lower_text("<p>@x</p>");
    assert!(diagnostics.is_empty());
    insta::assert_snapshot!(ir.dump(), @r#"
    Document
      Namespace
        Class
          Method
            MarkupContent "<p>" @0..3
            HostExpression "x" @4..5
            MarkupContent "</p>" @5..9
    "#);
}

#[test]
fn escaped_transition_keeps_its_span() {
    let (ir, _) = lower_text("<p>hi @@you</p>");
    let literals = ir
        .find_all(|n| matches!(n, IrNode::MarkupContent { .. }))
        .into_iter()
        .map(|id| {
            let IrNode::MarkupContent { text } = ir.node(id) else {
                unreachable!()
            };
            let span = ir.span(id).map(|s| s.range());
            (text.clone(), span)
        })
        .collect::<Vec<_>>();
    assert_eq!(
        literals,
        vec![
            ("<p>".to_string(), Some(0..3)),
            ("hi ".to_string(), Some(3..6)),
            ("@".to_string(), Some(6..8)),
            ("you".to_string(), Some(8..11)),
            ("</p>".to_string(), Some(11..15)),
        ]
    );
}

#[test]
fn dynamic_attribute() {
    let (ir, _) = lower_text("<a href=\"/u/@id\">x</a>");
    insta::assert_snapshot!(ir.dump(), @r#"
    Document
      Namespace
        Class
          Method
            MarkupContent "<a " @0..3
            MarkupAttribute href "href=\"" "\"" @3..16
              MarkupContent "/u/" @9..12
              HostExpression "id" @13..15
            MarkupContent ">" @16..17
            MarkupContent "x" @17..18
            MarkupContent "</a>" @18..22
    "#);
}

#[test]
fn explicit_expression_excludes_parentheses() {
    let (ir, _) = lower_text("@(a + b)");
    let expression = ir
        .find(|n| matches!(n, IrNode::HostExpression { .. }))
        .expect("expression");
    assert_eq!(
        ir.node(expression),
        &IrNode::HostExpression {
            code: "a + b".to_string()
        }
    );
    assert_eq!(ir.span(expression).map(|s| s.range()), Some(2..7));
}

#[test]
fn code_block_is_flattened() {
    let (ir, _) = lower_text("@{ var x = 1; }");
    let code = ir.find_all(|n| matches!(n, IrNode::HostCode { .. }));
    assert_eq!(code.len(), 1);
    assert_eq!(
        ir.node(code[0]),
        &IrNode::HostCode {
            code: " var x = 1; ".to_string()
        }
    );
    assert_eq!(ir.parent(code[0]), ir.method());
}

#[test]
fn statement_with_nested_markup() {
    let (ir, diagnostics) = lower_text("@if (ok) { <b>@name</b> }");
    assert!(diagnostics.is_empty());
    let kinds = ir
        .children(ir.method().expect("method"))
        .iter()
        .map(|&id| ir.node(id).kind_name())
        .collect::<Vec<_>>();
    assert_eq!(
        kinds,
        vec![
            "HostCode",
            "MarkupContent",
            "HostExpression",
            "MarkupContent",
            "HostCode"
        ]
    );
}

#[test]
fn comments_produce_nothing() {
    let (ir, _) = lower_text("a@* note *@b");
    let method = ir.method().expect("method");
    assert_eq!(ir.children(method).len(), 2);
}

#[test]
fn valid_directives_keep_their_tokens() {
    let (ir, diagnostics) = lower_text("@inject ILogger<Cart> Logger\n<p></p>");
    assert!(diagnostics.is_empty());
    let tokens = ir
        .find_all(|n| matches!(n, IrNode::DirectiveToken { .. }))
        .into_iter()
        .map(|id| ir.node(id).clone())
        .collect::<Vec<_>>();
    assert_eq!(
        tokens,
        vec![
            IrNode::DirectiveToken {
                kind: DirectiveTokenKind::Type,
                text: "ILogger<Cart>".to_string()
            },
            IrNode::DirectiveToken {
                kind: DirectiveTokenKind::Member,
                text: "Logger".to_string()
            },
        ]
    );
}

#[test]
fn malformed_directive_is_diagnostic_only() {
    let (ir, diagnostics) = lower_text("<p>a</p>\n@model Cart Extra\n<p>b</p>");
    let messages = diagnostics
        .iter()
        .map(Diagnostic::message)
        .collect::<Vec<_>>();
    assert_eq!(
        messages,
        vec!["Unexpected \"Extra\" after the \"model\" directive"]
    );
    assert_eq!(diagnostics[0].span.range(), 21..26);

    let malformed = ir
        .find(|n| matches!(n, IrNode::MalformedDirective { .. }))
        .expect("malformed node");
    assert!(ir.children(malformed).is_empty());
    assert_eq!(ir.get(malformed).diagnostics.len(), 1);
    assert!(ir.find(|n| matches!(n, IrNode::Directive { .. })).is_none());
}

#[test]
fn missing_directive_token() {
    let (_, diagnostics) = lower_text("@model\n");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].message(),
        "The \"model\" directive expects a type name"
    );
    assert_eq!(diagnostics[0].span.range(), 6..6);
}

#[test]
fn missing_second_token_points_after_the_first() {
    let (_, diagnostics) = lower_text("@inject ILogger\n");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].message(),
        "The \"inject\" directive expects a member name"
    );
    assert_eq!(diagnostics[0].span.range(), 15..15);
}

#[test]
fn import_directives_have_no_spans() {
    let (ir, diagnostics) = lower_with_imports("<p></p>", &["@inherits Base\n<p>ignored</p>"]);
    assert!(diagnostics.is_empty());
    let directive = ir
        .find(|n| matches!(n, IrNode::Directive { .. }))
        .expect("import directive");
    assert!(ir.span(directive).is_none());
    assert!(
        ir.children(directive)
            .iter()
            .all(|&token| ir.span(token).is_none())
    );
    // the import's markup is not part of the document
    let literals = ir.find_all(|n| matches!(n, IrNode::MarkupContent { .. }));
    assert_eq!(literals.len(), 2);
}

#[test]
fn section_body_is_lowered_under_directive() {
    let (ir, diagnostics) = lower_text("@section Scripts {\n<b>x</b>\n}\n");
    assert!(diagnostics.is_empty());
    let directive = ir
        .find(|n| matches!(n, IrNode::Directive { .. }))
        .expect("section");
    assert_eq!(
        ir.node(directive),
        &IrNode::Directive {
            name: "section".to_string(),
            has_body: true
        }
    );
    let children = ir
        .children(directive)
        .iter()
        .map(|&id| ir.node(id).kind_name())
        .collect::<Vec<_>>();
    assert_eq!(children[0], "DirectiveToken");
    assert!(children[1..].iter().all(|&kind| kind == "MarkupContent"));
}
