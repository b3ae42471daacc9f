//! # Directive Registry
//!
//! Directives are recognised by name and validated against a token shape.
//! The registry is an immutable value; compilations share it through an
//! `Arc` and it also produces the [`ParseOptions`] the parser needs.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use quill_syntax::{DirectiveBody, ParseOptions};
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    SingleLine,
    CodeBlock,
    MarkupBlock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveUsage {
    Unrestricted,
    FileScopedMultipleOccurring,
    FileScopedSinglyOccurring,
}

impl DirectiveUsage {
    pub fn is_file_scoped(self) -> bool {
        !matches!(self, Self::Unrestricted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveTokenKind {
    Type,
    Namespace,
    Member,
    String,
}

impl DirectiveTokenKind {
    /// Whether `text` has the shape this token kind expects.
    pub fn accepts(self, text: &str) -> bool {
        shape(self).is_match(text)
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::Type => "type name",
            Self::Namespace => "namespace",
            Self::Member => "member name",
            Self::String => "string literal",
        }
    }
}

fn shape(kind: DirectiveTokenKind) -> &'static Regex {
    static TYPE: OnceLock<Regex> = OnceLock::new();
    static NAMESPACE: OnceLock<Regex> = OnceLock::new();
    static MEMBER: OnceLock<Regex> = OnceLock::new();
    static STRING: OnceLock<Regex> = OnceLock::new();

    match kind {
        DirectiveTokenKind::Type => TYPE.get_or_init(|| {
            Regex::new(r"^(global::)?[A-Za-z_]\w*(\.[A-Za-z_]\w*)*(<[\w.,\s<>\[\]?:]+>)?(\[\])*\??$")
                .expect("Invalid type regex")
        }),
        DirectiveTokenKind::Namespace => NAMESPACE.get_or_init(|| {
            Regex::new(r"^[A-Za-z_]\w*(\.[A-Za-z_]\w*)*$").expect("Invalid namespace regex")
        }),
        DirectiveTokenKind::Member => MEMBER
            .get_or_init(|| Regex::new(r"^@?[A-Za-z_]\w*$").expect("Invalid member regex")),
        DirectiveTokenKind::String => STRING
            .get_or_init(|| Regex::new(r#"^"([^"\\]|\\.)*"$"#).expect("Invalid string regex")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirectiveTokenDescriptor {
    pub kind: DirectiveTokenKind,
    pub optional: bool,
}

impl DirectiveTokenDescriptor {
    pub fn required(kind: DirectiveTokenKind) -> Self {
        Self {
            kind,
            optional: false,
        }
    }

    pub fn optional(kind: DirectiveTokenKind) -> Self {
        Self {
            kind,
            optional: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown directive token kind `{0}`, expected type, namespace, member or string")]
pub struct TokenKindParseError(String);

/// Parses `type`, `namespace`, `member` or `string`, with a `?` suffix for
/// optional tokens.
impl FromStr for DirectiveTokenDescriptor {
    type Err = TokenKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, optional) = match s.strip_suffix('?') {
            Some(name) => (name, true),
            None => (s, false),
        };
        let kind = match name.trim().to_ascii_lowercase().as_str() {
            "type" => DirectiveTokenKind::Type,
            "namespace" => DirectiveTokenKind::Namespace,
            "member" => DirectiveTokenKind::Member,
            "string" => DirectiveTokenKind::String,
            _ => return Err(TokenKindParseError(s.to_string())),
        };
        Ok(Self { kind, optional })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirectiveDescriptor {
    pub name: String,
    pub kind: DirectiveKind,
    pub usage: DirectiveUsage,
    pub tokens: Vec<DirectiveTokenDescriptor>,
}

impl DirectiveDescriptor {
    pub fn new(
        name: impl Into<String>,
        kind: DirectiveKind,
        usage: DirectiveUsage,
        tokens: impl IntoIterator<Item = DirectiveTokenDescriptor>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            usage,
            tokens: tokens.into_iter().collect(),
        }
    }

    pub fn body(&self) -> DirectiveBody {
        match self.kind {
            DirectiveKind::SingleLine => DirectiveBody::None,
            DirectiveKind::CodeBlock => DirectiveBody::Code,
            DirectiveKind::MarkupBlock => DirectiveBody::Markup,
        }
    }
}

impl fmt::Display for DirectiveDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)?;
        for token in &self.tokens {
            let suffix = if token.optional { "?" } else { "" };
            write!(f, " <{}{}>", token.kind.describe(), suffix)?;
        }
        match self.kind {
            DirectiveKind::SingleLine => Ok(()),
            DirectiveKind::CodeBlock => write!(f, " {{ code }}"),
            DirectiveKind::MarkupBlock => write!(f, " {{ markup }}"),
        }
    }
}

/// Immutable name → descriptor table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveRegistry {
    directives: Vec<DirectiveDescriptor>,
}

impl DirectiveRegistry {
    pub fn new(directives: impl IntoIterator<Item = DirectiveDescriptor>) -> Self {
        let mut registry = Self::default();
        for directive in directives {
            registry.insert(directive);
        }
        registry
    }

    /// `using`, `inherits`, `model`, `inject`, `namespace`, `functions`,
    /// `code` and `section`.
    pub fn builtin() -> Self {
        use DirectiveKind::*;
        use DirectiveTokenKind as Token;
        use DirectiveUsage::*;

        let required = DirectiveTokenDescriptor::required;
        Self::new([
            DirectiveDescriptor::new(
                "using",
                SingleLine,
                FileScopedMultipleOccurring,
                [required(Token::Namespace)],
            ),
            DirectiveDescriptor::new(
                "inherits",
                SingleLine,
                FileScopedSinglyOccurring,
                [required(Token::Type)],
            ),
            DirectiveDescriptor::new(
                "model",
                SingleLine,
                FileScopedSinglyOccurring,
                [required(Token::Type)],
            ),
            DirectiveDescriptor::new(
                "inject",
                SingleLine,
                FileScopedMultipleOccurring,
                [required(Token::Type), required(Token::Member)],
            ),
            DirectiveDescriptor::new(
                "namespace",
                SingleLine,
                FileScopedSinglyOccurring,
                [required(Token::Namespace)],
            ),
            DirectiveDescriptor::new("functions", CodeBlock, Unrestricted, []),
            DirectiveDescriptor::new("code", CodeBlock, Unrestricted, []),
            DirectiveDescriptor::new(
                "section",
                MarkupBlock,
                Unrestricted,
                [required(Token::Member)],
            ),
        ])
    }

    /// Adds a descriptor, replacing any existing one with the same name.
    #[must_use]
    pub fn with(mut self, directive: DirectiveDescriptor) -> Self {
        self.insert(directive);
        self
    }

    fn insert(&mut self, directive: DirectiveDescriptor) {
        match self
            .directives
            .iter_mut()
            .find(|d| d.name == directive.name)
        {
            Some(existing) => *existing = directive,
            None => self.directives.push(directive),
        }
    }

    pub fn get(&self, name: &str) -> Option<&DirectiveDescriptor> {
        self.directives.iter().find(|d| d.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DirectiveDescriptor> {
        self.directives.iter()
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// What the parser needs to know: names and body kinds.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions::new(
            self.directives
                .iter()
                .map(|d| quill_syntax::DirectiveSyntax::new(d.name.clone(), d.body())),
        )
    }
}
