//! Directive lowering: header words are checked against the registered
//! token shape before anything is emitted.

use std::ops::Range;

use quill_syntax::{SyntaxElement, SyntaxKind, SyntaxNode};

use super::{Lowerer, range_of};
use crate::diagnostics::{Diagnostic, codes};
use crate::directives::{DirectiveDescriptor, DirectiveKind, DirectiveTokenKind};
use crate::ir::{IrNode, NodeId};

impl Lowerer<'_> {
    /// `@name words... { body }`
    pub(super) fn directive(&mut self, node: &SyntaxNode, parent: NodeId) {
        let range = range_of(node.text_range());
        let tokens = node
            .children_with_tokens()
            .filter_map(SyntaxElement::into_token)
            .collect::<Vec<_>>();
        let Some(name_token) = tokens.iter().find(|t| t.kind() == SyntaxKind::IDENT) else {
            return;
        };
        let name = name_token.text().to_string();
        let name_range = range_of(name_token.text_range());
        let header_end = tokens
            .iter()
            .find(|t| t.kind() == SyntaxKind::L_BRACE)
            .map_or(range.end, |t| usize::from(t.text_range().start()));
        let header_range = name_range.end..header_end.max(name_range.end);
        let body = node
            .children()
            .find(|n| n.kind() == SyntaxKind::DIRECTIVE_BODY);

        let Some(descriptor) = self.registry.get(&name).cloned() else {
            let diagnostic =
                codes::UNKNOWN_DIRECTIVE.create(self.diagnostic_span(name_range), [name.as_str()]);
            self.malformed(parent, name, range, vec![diagnostic]);
            return;
        };

        let header = self.text(header_range.clone());
        let words = header_words(&header)
            .into_iter()
            .map(|word| header_range.start + word.start..header_range.start + word.end)
            .collect::<Vec<_>>();

        let matched = match self.match_tokens(&descriptor, &words, name_range.end) {
            Ok(matched) => matched,
            Err(errors) => {
                self.malformed(parent, name, range, errors);
                return;
            }
        };

        let directive = self.push(
            parent,
            IrNode::Directive {
                name,
                has_body: body.is_some(),
            },
            range,
        );
        for (kind, word) in matched {
            let text = self.text(word.clone());
            self.push(directive, IrNode::DirectiveToken { kind, text }, word);
        }
        if let Some(body) = body
            && descriptor.kind != DirectiveKind::SingleLine
        {
            self.node(&body, directive);
        }
    }

    fn match_tokens(
        &self,
        descriptor: &DirectiveDescriptor,
        words: &[Range<usize>],
        name_end: usize,
    ) -> Result<Vec<(DirectiveTokenKind, Range<usize>)>, Vec<Diagnostic>> {
        let name = descriptor.name.as_str();
        let mut matched = Vec::new();
        let mut errors = Vec::new();
        let mut next = 0usize;

        for expected in &descriptor.tokens {
            let missing_at = next
                .checked_sub(1)
                .and_then(|i| words.get(i))
                .map_or(name_end, |w| w.end);
            match words.get(next) {
                Some(word) if expected.kind.accepts(&self.text(word.clone())) => {
                    matched.push((expected.kind, word.clone()));
                    next += 1;
                }
                Some(_) if expected.optional => {}
                Some(word) => {
                    errors.push(codes::MALFORMED_DIRECTIVE_TOKEN.create(
                        self.diagnostic_span(word.clone()),
                        [name, expected.kind.describe()],
                    ));
                    next += 1;
                }
                None if expected.optional => {}
                None => errors.push(codes::MALFORMED_DIRECTIVE_TOKEN.create(
                    self.diagnostic_span(missing_at..missing_at),
                    [name, expected.kind.describe()],
                )),
            }
        }

        for word in words.iter().skip(next) {
            let text = self.text(word.clone());
            errors.push(codes::UNEXPECTED_DIRECTIVE_TOKEN.create(
                self.diagnostic_span(word.clone()),
                [name, text.as_str()],
            ));
        }

        if errors.is_empty() {
            Ok(matched)
        } else {
            Err(errors)
        }
    }

    fn malformed(
        &mut self,
        parent: NodeId,
        name: String,
        range: Range<usize>,
        errors: Vec<Diagnostic>,
    ) {
        log::debug!("directive @{name} is malformed ({} errors)", errors.len());
        let node = self.push(parent, IrNode::MalformedDirective { name }, range);
        self.ir.get_mut(node).diagnostics.extend(errors.iter().cloned());
        for error in errors {
            self.report(error);
        }
    }
}

/// Byte ranges of the whitespace-separated words of a directive header.
///
/// Whitespace inside `<>`, `()`, `[]` or quotes does not split, so
/// `Dictionary<string, int>` is one word. A trailing `;` is dropped.
fn header_words(header: &str) -> Vec<Range<usize>> {
    let mut words = Vec::new();
    let mut start = None;
    let mut nesting = 0u32;
    let mut quote = None;
    let mut escaped = false;

    for (i, c) in header.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            c if c.is_whitespace() && nesting == 0 => {
                if let Some(s) = start.take() {
                    words.push(s..i);
                }
                continue;
            }
            '"' | '\'' => quote = Some(c),
            '<' | '(' | '[' => nesting += 1,
            '>' | ')' | ']' => nesting = nesting.saturating_sub(1),
            _ => {}
        }
        start.get_or_insert(i);
    }
    if let Some(s) = start {
        words.push(s..header.len());
    }

    if let Some(last) = words.last_mut()
        && header[last.clone()].ends_with(';')
    {
        last.end -= 1;
        if last.start == last.end {
            words.pop();
        }
    }
    words
}
