//! # Lowering
//!
//! Turns a syntax tree into the IR skeleton
//! `Document → Namespace → Class → Method` with the document's content under
//! the method.
//!
//! - Markup tokens become `MarkupContent`, one literal per run of direct
//!   tokens of a markup node; `MergeMarkupPass` joins neighbours later.
//! - `@@` becomes a one-character literal over its two-byte span.
//! - Expressions and code become `HostExpression` / `HostCode`; code blocks
//!   and statements are flattened so nested markup sits beside the code.
//! - Attributes whose value holds an expression become `MarkupAttribute`.
//! - Directives are validated against the registry and become `Directive`
//!   or diagnostic-only `MalformedDirective` nodes.
//! - Comments and error nodes produce nothing.
//!
//! Imports contribute only their top-level directives, lowered before the
//! document's content and without source spans, so they never map.

mod directive;

use std::ops::Range;

use quill_syntax::{SyntaxElement, SyntaxKind, SyntaxNode, TextRange};

use crate::diagnostics::Diagnostic;
use crate::directives::DirectiveRegistry;
use crate::ir::{IrNode, IrTree, NodeId, Symbol};
use crate::source::SourceSpan;
use crate::syntax::SyntaxTree;

/// Lowers `tree` (and the directives of `imports`, in order) into `ir`.
///
/// Returns the id of the method node that holds the document content.
pub fn lower(
    tree: &SyntaxTree,
    imports: &[SyntaxTree],
    registry: &DirectiveRegistry,
    ir: &mut IrTree,
    diagnostics: &mut Vec<Diagnostic>,
) -> NodeId {
    let root = ir.root();
    let namespace = ir.push(root, IrNode::Namespace { name: None }, None);
    let class = ir.push(
        namespace,
        IrNode::Class {
            name: String::new(),
            base_type: None,
            model: None,
        },
        None,
    );
    let method = ir.push(
        class,
        IrNode::Method {
            name: String::new(),
        },
        None,
    );

    for import in imports {
        let mut lowerer = Lowerer::new(import, registry, ir, diagnostics, false);
        for node in import.root().children() {
            if node.kind() == SyntaxKind::DIRECTIVE {
                lowerer.directive(&node, method);
            }
        }
    }

    let mut lowerer = Lowerer::new(tree, registry, ir, diagnostics, true);
    lowerer.markup(&tree.root(), method);

    log::debug!("lowered into {} IR nodes", ir.descendants(root).len());
    method
}

fn range_of(range: TextRange) -> Range<usize> {
    usize::from(range.start())..usize::from(range.end())
}

struct Lowerer<'a> {
    tree: &'a SyntaxTree,
    registry: &'a DirectiveRegistry,
    ir: &'a mut IrTree,
    diagnostics: &'a mut Vec<Diagnostic>,
    /// Whether IR nodes get source spans (false for imports).
    mapped: bool,
    /// Markup bytes not yet turned into a literal.
    pending: Option<Range<usize>>,
}

impl<'a> Lowerer<'a> {
    fn new(
        tree: &'a SyntaxTree,
        registry: &'a DirectiveRegistry,
        ir: &'a mut IrTree,
        diagnostics: &'a mut Vec<Diagnostic>,
        mapped: bool,
    ) -> Self {
        Self {
            tree,
            registry,
            ir,
            diagnostics,
            mapped,
            pending: None,
        }
    }

    fn span(&self, range: Range<usize>) -> Option<SourceSpan> {
        self.mapped
            .then(|| self.tree.source().clamped_span(range))
    }

    /// Span for diagnostics; real even for imports.
    fn diagnostic_span(&self, range: Range<usize>) -> SourceSpan {
        self.tree.source().clamped_span(range)
    }

    fn text(&self, range: Range<usize>) -> String {
        self.tree.source().slice(range).unwrap_or_default()
    }

    fn symbol(&self, range: Range<usize>) -> Symbol {
        Symbol::new(self.text(range.clone()), self.span(range))
    }

    fn push(&mut self, parent: NodeId, node: IrNode, range: Range<usize>) -> NodeId {
        let span = self.span(range);
        self.ir.push(parent, node, span)
    }

    fn accumulate(&mut self, parent: NodeId, range: Range<usize>) {
        match &mut self.pending {
            Some(pending) if pending.end == range.start => pending.end = range.end,
            _ => {
                self.flush(parent);
                self.pending = Some(range);
            }
        }
    }

    fn flush(&mut self, parent: NodeId) {
        if let Some(range) = self.pending.take() {
            let text = self.text(range.clone());
            self.push(parent, IrNode::MarkupContent { text }, range);
        }
    }

    /// Direct tokens of a markup node become literals; child nodes are
    /// lowered in place.
    fn markup(&mut self, node: &SyntaxNode, parent: NodeId) {
        for child in node.children_with_tokens() {
            self.markup_element(child, parent);
        }
        self.flush(parent);
    }

    fn markup_element(&mut self, element: SyntaxElement, parent: NodeId) {
        match element {
            SyntaxElement::Token(token) => {
                let range = range_of(token.text_range());
                if token.kind() == SyntaxKind::ESCAPED_TRANSITION {
                    self.flush(parent);
                    self.push(
                        parent,
                        IrNode::MarkupContent {
                            text: "@".to_string(),
                        },
                        range,
                    );
                } else {
                    self.accumulate(parent, range);
                }
            }
            SyntaxElement::Node(node) => {
                self.flush(parent);
                self.node(&node, parent);
            }
        }
    }

    fn node(&mut self, node: &SyntaxNode, parent: NodeId) {
        match node.kind() {
            SyntaxKind::ROOT
            | SyntaxKind::MARKUP_BLOCK
            | SyntaxKind::MARKUP_START_TAG
            | SyntaxKind::MARKUP_END_TAG
            | SyntaxKind::MARKUP_ATTRIBUTE_VALUE => self.markup(node, parent),
            SyntaxKind::MARKUP_ATTRIBUTE if is_dynamic(node) => self.attribute(node, parent),
            SyntaxKind::MARKUP_ATTRIBUTE => self.markup(node, parent),
            SyntaxKind::IMPLICIT_EXPRESSION | SyntaxKind::EXPLICIT_EXPRESSION => {
                self.expression(node, parent)
            }
            // `@:` and the braces are template syntax, only child nodes count
            SyntaxKind::MARKUP_LINE
            | SyntaxKind::CODE_BLOCK
            | SyntaxKind::STATEMENT
            | SyntaxKind::DIRECTIVE_BODY => {
                for child in node.children() {
                    self.node(&child, parent);
                }
            }
            SyntaxKind::HOST_CODE => {
                let range = range_of(node.text_range());
                let code = self.text(range.clone());
                self.push(parent, IrNode::HostCode { code }, range);
            }
            SyntaxKind::DIRECTIVE => self.directive(node, parent),
            _ => {}
        }
    }

    fn expression(&mut self, node: &SyntaxNode, parent: NodeId) {
        let range = range_of(node.text_range());
        let explicit = node.kind() == SyntaxKind::EXPLICIT_EXPRESSION;
        let mut tokens = node
            .children_with_tokens()
            .filter_map(SyntaxElement::into_token);
        // `@`, then `(` for explicit expressions
        let mut start = range.start;
        if let Some(transition) = tokens.next() {
            start = usize::from(transition.text_range().end());
        }
        if explicit && let Some(open) = tokens.next() {
            start = usize::from(open.text_range().end());
        }
        let end = match node.last_child_or_token() {
            Some(SyntaxElement::Token(close)) if explicit && close.kind() == SyntaxKind::R_PAREN => {
                usize::from(close.text_range().start())
            }
            _ => range.end,
        };
        let code_range = start..end.max(start);
        let code = self.text(code_range.clone());
        self.push(parent, IrNode::HostExpression { code }, code_range);
    }

    /// `name="literal @expr literal"`: prefix and suffix are the markup around
    /// the value parts.
    fn attribute(&mut self, node: &SyntaxNode, parent: NodeId) {
        let range = range_of(node.text_range());
        let name = node
            .first_token()
            .map(|t| t.text().to_string())
            .unwrap_or_default();
        let Some(value) = node
            .children()
            .find(|n| n.kind() == SyntaxKind::MARKUP_ATTRIBUTE_VALUE)
        else {
            self.markup(node, parent);
            return;
        };

        let parts = value.children_with_tokens().collect::<Vec<_>>();
        let open = parts
            .first()
            .and_then(|e| e.as_token())
            .filter(|t| matches!(t.kind(), SyntaxKind::DQUOTE | SyntaxKind::SQUOTE))
            .cloned();
        let close = parts
            .last()
            .and_then(|e| e.as_token())
            .filter(|t| parts.len() > 1 && Some(t.kind()) == open.as_ref().map(|o| o.kind()))
            .cloned();

        let value_range = range_of(value.text_range());
        let prefix_end = open
            .as_ref()
            .map_or(value_range.start, |t| usize::from(t.text_range().end()));
        let suffix_range = close
            .as_ref()
            .map_or(value_range.end..value_range.end, |t| range_of(t.text_range()));

        let prefix = self.symbol(range.start..prefix_end);
        let suffix = if suffix_range.is_empty() {
            Symbol::synthetic("")
        } else {
            self.symbol(suffix_range)
        };
        let attribute = self.push(
            parent,
            IrNode::MarkupAttribute {
                name,
                prefix,
                suffix,
            },
            range,
        );

        let skip_first = usize::from(open.is_some());
        let skip_last = usize::from(close.is_some());
        let count = parts.len().saturating_sub(skip_first + skip_last);
        for part in parts.into_iter().skip(skip_first).take(count) {
            self.markup_element(part, attribute);
        }
        self.flush(attribute);
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

/// Whether an attribute's value contains an expression or code.
fn is_dynamic(attribute: &SyntaxNode) -> bool {
    attribute.descendants().any(|n| {
        matches!(
            n.kind(),
            SyntaxKind::IMPLICIT_EXPRESSION
                | SyntaxKind::EXPLICIT_EXPRESSION
                | SyntaxKind::CODE_BLOCK
                | SyntaxKind::STATEMENT
        )
    })
}

#[cfg(test)]
mod tests;
