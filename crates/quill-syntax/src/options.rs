//! Parse-time knowledge the tokenizer needs: which directive names exist and
//! what kind of body each one takes.

/// Keywords that start a host statement directly after a transition.
pub const STATEMENT_KEYWORDS: &[&str] = &[
    "if", "for", "foreach", "while", "switch", "lock", "do", "try",
];

/// Keywords that continue a statement after its closing brace.
pub const CONTINUATION_KEYWORDS: &[&str] = &["else", "catch", "finally"];

/// Elements that never have a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

pub fn is_statement_keyword(word: &str) -> bool {
    STATEMENT_KEYWORDS.contains(&word)
}

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS
        .iter()
        .any(|void| void.eq_ignore_ascii_case(name))
}

/// What follows a directive's single-line header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveBody {
    /// Header only (`@using System.Text`)
    None,
    /// `{ host code }` (`@functions { ... }`)
    Code,
    /// `{ markup }` (`@section Scripts { ... }`)
    Markup,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirectiveSyntax {
    pub name: String,
    pub body: DirectiveBody,
}

impl DirectiveSyntax {
    pub fn new(name: impl Into<String>, body: DirectiveBody) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }
}

/// Options shared by the tokenizer and the grammar.
///
/// Only directives listed here are recognised; `@name` for any other name is
/// an implicit expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOptions {
    directives: Vec<DirectiveSyntax>,
}

impl ParseOptions {
    pub fn new(directives: impl IntoIterator<Item = DirectiveSyntax>) -> Self {
        Self {
            directives: directives.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn with_directive(mut self, name: impl Into<String>, body: DirectiveBody) -> Self {
        self.directives.push(DirectiveSyntax::new(name, body));
        self
    }

    pub fn directive(&self, name: &str) -> Option<&DirectiveSyntax> {
        self.directives.iter().find(|d| d.name == name)
    }

    pub fn directives(&self) -> &[DirectiveSyntax] {
        &self.directives
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_lookup_by_name() {
        let options = ParseOptions::default()
            .with_directive("using", DirectiveBody::None)
            .with_directive("section", DirectiveBody::Markup);

        assert_eq!(
            options.directive("section").map(|d| d.body),
            Some(DirectiveBody::Markup)
        );
        assert!(options.directive("model").is_none());
    }

    #[test]
    fn void_elements_ignore_case() {
        assert!(is_void_element("br"));
        assert!(is_void_element("IMG"));
        assert!(!is_void_element("p"));
    }
}
