//! The parse stage: a [`quill_syntax`] tree bound to its source, with syntax
//! errors converted into diagnostics.

use quill_syntax::{
    Parse, ParseOptions, SyntaxError, SyntaxErrorKind, SyntaxNode, TextRange,
    parse_with_options,
};

use crate::diagnostics::{Diagnostic, codes};
use crate::source::{SourceSpan, SourceText};

/// An immutable syntax tree over one source text.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: SourceText,
    parse: Parse,
    diagnostics: Vec<Diagnostic>,
}

impl SyntaxTree {
    pub fn parse(source: &SourceText, options: &ParseOptions) -> Self {
        let parse = parse_with_options(&source.text(), options);
        let diagnostics = parse
            .errors()
            .iter()
            .map(|error| diagnostic_for(source, error))
            .collect::<Vec<_>>();
        log::debug!(
            "parsed {} ({} bytes, {} diagnostics)",
            source.path().unwrap_or("<memory>"),
            source.len(),
            diagnostics.len()
        );
        Self {
            source: source.clone(),
            parse,
            diagnostics,
        }
    }

    pub fn source(&self) -> &SourceText {
        &self.source
    }

    pub fn root(&self) -> SyntaxNode {
        self.parse.syntax_node()
    }

    pub fn errors(&self) -> &[SyntaxError] {
        self.parse.errors()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Source span of a tree range.
    pub fn span(&self, range: TextRange) -> SourceSpan {
        self.source
            .clamped_span(usize::from(range.start())..usize::from(range.end()))
    }
}

fn diagnostic_for(source: &SourceText, error: &SyntaxError) -> Diagnostic {
    let span = source.clamped_span(error.range.clone());
    match &error.kind {
        SyntaxErrorKind::UnterminatedCodeBlock => codes::UNTERMINATED_CODE_BLOCK.at(span),
        SyntaxErrorKind::UnterminatedExplicitExpression => {
            codes::UNTERMINATED_EXPLICIT_EXPRESSION.at(span)
        }
        SyntaxErrorKind::UnterminatedComment => codes::UNTERMINATED_COMMENT.at(span),
        SyntaxErrorKind::UnterminatedString => codes::UNTERMINATED_STRING.at(span),
        SyntaxErrorKind::UnclosedDelimiter { open } => {
            codes::UNCLOSED_DELIMITER.create(span, [open.to_string()])
        }
        SyntaxErrorKind::UnexpectedDelimiter { close } => {
            codes::UNEXPECTED_DELIMITER.create(span, [close.to_string()])
        }
        SyntaxErrorKind::InvalidTransition { found } => {
            let found = match found {
                Some(c) if c.is_whitespace() => "Whitespace".to_string(),
                Some(c) => format!("\"{c}\""),
                None => "End of file".to_string(),
            };
            codes::INVALID_TRANSITION.create(span, [found])
        }
        SyntaxErrorKind::ExpectedStatementBlock { keyword } => {
            codes::EXPECTED_STATEMENT_BLOCK.create(span, [keyword.as_str()])
        }
        SyntaxErrorKind::MissingDirectiveBody { directive } => {
            codes::MISSING_DIRECTIVE_BODY.create(span, [directive.as_str()])
        }
        SyntaxErrorKind::UnterminatedDirectiveBody { directive } => {
            codes::UNTERMINATED_DIRECTIVE_BODY.create(span, [directive.as_str()])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directives::DirectiveRegistry;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> SyntaxTree {
        let source = SourceText::with_path("Index.qtml", text);
        SyntaxTree::parse(&source, &DirectiveRegistry::builtin().parse_options())
    }

    #[test]
    fn valid_template_has_no_diagnostics() {
        let tree = parse("<p>@Model.Name</p>\n");
        assert!(tree.diagnostics().is_empty());
        assert_eq!(tree.root().text().to_string(), "<p>@Model.Name</p>\n");
    }

    #[test]
    fn errors_become_diagnostics_with_spans() {
        let tree = parse("<p>\n@{ var x = 1;");
        let diagnostics = tree
            .diagnostics()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        assert_eq!(
            diagnostics,
            vec!["Index.qtml(2,1): error QL1001: The code block is missing a closing \"}\" character"]
        );
    }

    #[test]
    fn invalid_transition_names_what_follows() {
        let tree = parse("a @ b");
        let messages = tree
            .diagnostics()
            .iter()
            .map(Diagnostic::message)
            .collect::<Vec<_>>();
        assert_eq!(
            messages,
            vec!["Whitespace is not valid at the start of a code block or expression"]
        );
    }

    #[test]
    fn span_converts_text_ranges() {
        let tree = parse("<p>\n@x");
        let range = TextRange::new(5.into(), 6.into());
        assert_eq!(
            tree.span(range),
            SourceSpan::new(Some("Index.qtml".to_string()), 5, 1, 1, 1)
        );
    }
}
