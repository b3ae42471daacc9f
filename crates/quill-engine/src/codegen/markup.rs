//! The markup document keeps every markup byte at its original offset.
//! Host code is blanked to spaces (newlines kept) and each expression
//! leaves a `~` placeholder, so markup tooling sees well-formed structure
//! with identical line numbers.

use super::CodeWriter;
use crate::diagnostics::codes;
use crate::ir::{IrNode, IrTree, Symbol};
use crate::source::{SourceSpan, SourceText};

const PLACEHOLDER: &str = "~";

struct Item<'a> {
    text: &'a str,
    span: Option<&'a SourceSpan>,
    mapped: bool,
}

fn symbol_item(symbol: &Symbol) -> Item<'_> {
    Item {
        text: &symbol.text,
        span: symbol.span.as_ref(),
        mapped: true,
    }
}

fn items(ir: &IrTree) -> Vec<Item<'_>> {
    let mut items = Vec::new();
    for id in ir.descendants(ir.root()) {
        match ir.node(id) {
            IrNode::MarkupContent { text } => items.push(Item {
                text,
                span: ir.span(id),
                mapped: true,
            }),
            IrNode::MarkupAttribute { prefix, suffix, .. } => {
                items.push(symbol_item(prefix));
                items.push(symbol_item(suffix));
            }
            IrNode::HostExpression { .. } => {
                if let Some(span) = ir.span(id) {
                    items.push(Item {
                        text: PLACEHOLDER,
                        span: Some(span),
                        mapped: false,
                    });
                }
            }
            _ => {}
        }
    }
    items
}

pub(super) fn write(source: &SourceText, ir: &IrTree) -> CodeWriter {
    let text = source.text();
    let (mut placed, unplaced): (Vec<_>, Vec<_>) =
        items(ir).into_iter().partition(|item| item.span.is_some());
    placed.sort_by_key(|item| item.span.map_or(0, |span| span.absolute_index));

    let mut writer = CodeWriter::new();
    for item in placed {
        let Some(span) = item.span else { continue };
        if span.absolute_index < writer.position() {
            log::trace!("markup item at {} overlaps, skipped", span.absolute_index);
            writer.report(codes::OVERLAPPING_MARKUP.create(span.clone(), [item.text]));
            continue;
        }
        writer.pad_to(span.absolute_index, &text);
        writer.write_mapped(item.text, item.mapped.then_some(span));
    }
    writer.pad_to(source.len(), &text);

    // markup contributed without a source position goes after the document
    for item in unplaced {
        writer.write(item.text);
    }
    writer
}
