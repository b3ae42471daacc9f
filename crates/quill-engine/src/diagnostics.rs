//! Diagnostics recorded on syntax trees and code documents.
//!
//! A [`Diagnostic`] is a descriptor (stable id, severity, message template)
//! plus the arguments for the template and the span it points at. Messages
//! use positional `{0}`, `{1}` placeholders.

use std::fmt;

use serde::Serialize;

use crate::source::SourceSpan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagnosticDescriptor {
    pub id: &'static str,
    pub severity: Severity,
    pub message_format: &'static str,
}

impl DiagnosticDescriptor {
    pub const fn new(id: &'static str, severity: Severity, message_format: &'static str) -> Self {
        Self {
            id,
            severity,
            message_format,
        }
    }

    pub fn create<I, S>(&self, span: SourceSpan, args: I) -> Diagnostic
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Diagnostic {
            id: self.id,
            severity: self.severity,
            message_format: self.message_format,
            args: args.into_iter().map(Into::into).collect(),
            span,
        }
    }

    /// A diagnostic for a message without placeholders.
    pub fn at(&self, span: SourceSpan) -> Diagnostic {
        self.create(span, std::iter::empty::<String>())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Diagnostic {
    pub id: &'static str,
    pub severity: Severity,
    pub message_format: &'static str,
    pub args: Vec<String>,
    pub span: SourceSpan,
}

impl Diagnostic {
    /// The message template with its arguments substituted.
    pub fn message(&self) -> String {
        let mut message = self.message_format.to_string();
        for (index, arg) in self.args.iter().enumerate() {
            message = message.replace(&format!("{{{index}}}"), arg);
        }
        message
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(
            f,
            "{}({},{}): {} {}: {}",
            self.span.file_path.as_deref().unwrap_or("<unknown>"),
            self.span.line_index + 1,
            self.span.character_index + 1,
            severity,
            self.id,
            self.message()
        )
    }
}

/// Diagnostic descriptors, grouped by the stage that reports them.
pub mod codes {
    use super::{DiagnosticDescriptor, Severity};

    // === Parsing ===

    pub const UNTERMINATED_CODE_BLOCK: DiagnosticDescriptor = DiagnosticDescriptor::new(
        "QL1001",
        Severity::Error,
        "The code block is missing a closing \"}\" character",
    );
    pub const UNTERMINATED_EXPLICIT_EXPRESSION: DiagnosticDescriptor = DiagnosticDescriptor::new(
        "QL1002",
        Severity::Error,
        "The explicit expression is missing a closing \")\" character",
    );
    pub const UNTERMINATED_COMMENT: DiagnosticDescriptor = DiagnosticDescriptor::new(
        "QL1003",
        Severity::Error,
        "End of file was reached before the end of the template comment",
    );
    pub const UNTERMINATED_STRING: DiagnosticDescriptor =
        DiagnosticDescriptor::new("QL1004", Severity::Error, "Unterminated string literal");
    pub const UNCLOSED_DELIMITER: DiagnosticDescriptor = DiagnosticDescriptor::new(
        "QL1005",
        Severity::Error,
        "The \"{0}\" is never closed",
    );
    pub const UNEXPECTED_DELIMITER: DiagnosticDescriptor = DiagnosticDescriptor::new(
        "QL1006",
        Severity::Error,
        "Unexpected \"{0}\" without a matching opening delimiter",
    );
    pub const INVALID_TRANSITION: DiagnosticDescriptor = DiagnosticDescriptor::new(
        "QL1007",
        Severity::Error,
        "{0} is not valid at the start of a code block or expression",
    );
    pub const EXPECTED_STATEMENT_BLOCK: DiagnosticDescriptor = DiagnosticDescriptor::new(
        "QL1008",
        Severity::Error,
        "Expected a \"{\" block after the \"{0}\" keyword",
    );
    pub const MISSING_DIRECTIVE_BODY: DiagnosticDescriptor = DiagnosticDescriptor::new(
        "QL1009",
        Severity::Error,
        "The \"{0}\" directive expects a body enclosed in \"{\" and \"}\"",
    );
    pub const UNTERMINATED_DIRECTIVE_BODY: DiagnosticDescriptor = DiagnosticDescriptor::new(
        "QL1010",
        Severity::Error,
        "The body of the \"{0}\" directive is missing a closing \"}\" character",
    );

    // === Lowering and directive validation ===

    pub const UNKNOWN_DIRECTIVE: DiagnosticDescriptor = DiagnosticDescriptor::new(
        "QL2001",
        Severity::Error,
        "Unknown directive \"{0}\"",
    );
    pub const MALFORMED_DIRECTIVE_TOKEN: DiagnosticDescriptor = DiagnosticDescriptor::new(
        "QL2002",
        Severity::Error,
        "The \"{0}\" directive expects a {1}",
    );
    pub const UNEXPECTED_DIRECTIVE_TOKEN: DiagnosticDescriptor = DiagnosticDescriptor::new(
        "QL2003",
        Severity::Error,
        "Unexpected \"{1}\" after the \"{0}\" directive",
    );

    // === Passes ===

    pub const DIRECTIVE_NOT_FILE_SCOPED: DiagnosticDescriptor = DiagnosticDescriptor::new(
        "QL2004",
        Severity::Error,
        "The \"{0}\" directive must appear at the top level of the document",
    );
    pub const DUPLICATE_DIRECTIVE: DiagnosticDescriptor = DiagnosticDescriptor::new(
        "QL2005",
        Severity::Error,
        "The \"{0}\" directive may only occur once per document",
    );
    pub const NESTED_SECTION: DiagnosticDescriptor = DiagnosticDescriptor::new(
        "QL2006",
        Severity::Error,
        "Section \"{0}\" cannot be defined inside another section",
    );
    pub const SECTION_MISSING_BODY: DiagnosticDescriptor = DiagnosticDescriptor::new(
        "QL2007",
        Severity::Error,
        "Section \"{0}\" has no body",
    );
    pub const DUPLICATE_SECTION: DiagnosticDescriptor = DiagnosticDescriptor::new(
        "QL2008",
        Severity::Warning,
        "Section \"{0}\" is already defined",
    );

    // === Code writers ===

    pub const OVERLAPPING_MARKUP: DiagnosticDescriptor = DiagnosticDescriptor::new(
        "QL3001",
        Severity::Warning,
        "Markup \"{0}\" overlaps earlier output and is left out of the markup document",
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> SourceSpan {
        SourceSpan::new(Some("Index.qtml".to_string()), 4, 1, 2, 3)
    }

    #[test]
    fn message_substitutes_arguments() {
        let diagnostic = codes::UNEXPECTED_DIRECTIVE_TOKEN.create(span(), ["model", "Foo"]);
        assert_eq!(
            diagnostic.message(),
            "Unexpected \"Foo\" after the \"model\" directive"
        );
        assert!(diagnostic.is_error());
    }

    #[test]
    fn message_keeps_literal_braces() {
        let diagnostic = codes::EXPECTED_STATEMENT_BLOCK.create(span(), ["if"]);
        assert_eq!(
            diagnostic.message(),
            "Expected a \"{\" block after the \"if\" keyword"
        );
    }

    #[test]
    fn display_is_one_based() {
        let diagnostic = codes::DUPLICATE_SECTION.create(span(), ["Scripts"]);
        insta::assert_snapshot!(
            diagnostic.to_string(),
            @r#"Index.qtml(2,3): warning QL2008: Section "Scripts" is already defined"#
        );
    }
}
