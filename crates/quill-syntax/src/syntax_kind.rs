//! SyntaxKind enum for all tokens and nodes in the template CST.
//!
//! Following the rust-analyzer model, all tokens and nodes share a single enum.
//! Every byte in the source must appear as a token in the tree.

/// All syntax kinds for the template CST.
///
/// Tokens come from three tokenizer families: markup, template (transitions
/// and comments) and host code. The `repr(u16)` ensures efficient storage in
/// rowan's green tree.
///
/// We use SCREAMING_CASE following the rust-analyzer convention for SyntaxKind.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // === Shared trivia ===
    /// Horizontal whitespace (spaces, tabs)
    WHITESPACE,
    /// Line ending
    NEWLINE,

    // === Markup tokens ===
    /// Markup text run (tag names, attribute names, content)
    TEXT,
    /// `<`
    LT,
    /// `</`
    LT_SLASH,
    /// `>`
    GT,
    /// `/>`
    SLASH_GT,
    /// `=` inside a tag
    EQ,
    /// `"` around attribute values
    DQUOTE,
    /// `'` around attribute values
    SQUOTE,

    // === Template tokens ===
    /// `@`
    TRANSITION,
    /// `@@`, a literal `@` in markup
    ESCAPED_TRANSITION,
    /// `@* ... *@`
    TEMPLATE_COMMENT,

    // === Host code tokens ===
    /// Identifier or keyword
    IDENT,
    /// Numeric literal
    NUMBER,
    /// String literal, possibly unterminated
    STRING,
    /// Character literal
    CHAR,
    /// `{`
    L_BRACE,
    /// `}`
    R_BRACE,
    /// `(`
    L_PAREN,
    /// `)`
    R_PAREN,
    /// `[`
    L_BRACKET,
    /// `]`
    R_BRACKET,
    /// `;`
    SEMICOLON,
    /// `.`
    DOT,
    /// `,`
    COMMA,
    /// `:`
    COLON,
    /// Operator run (`==`, `+`, `=>`, ...)
    OPERATOR,
    /// `// ...`
    LINE_COMMENT,
    /// `/* ... */`
    BLOCK_COMMENT,
    /// Character the host tokenizer does not recognise
    UNKNOWN,
    /// End of file marker
    EOF,

    // === Composite Nodes (parser output) ===
    /// Root document node
    ROOT,
    /// Run of markup content
    MARKUP_BLOCK,
    /// `<name attr="...">`
    MARKUP_START_TAG,
    /// `</name>`
    MARKUP_END_TAG,
    /// `name="value"` inside a start tag
    MARKUP_ATTRIBUTE,
    /// Quoted attribute value, may contain transitions
    MARKUP_ATTRIBUTE_VALUE,
    /// `@:` single line of markup inside code
    MARKUP_LINE,
    /// `@{ ... }`
    CODE_BLOCK,
    /// `@if (...) { ... }` and friends
    STATEMENT,
    /// `@( ... )`
    EXPLICIT_EXPRESSION,
    /// `@name.member(...)`
    IMPLICIT_EXPRESSION,
    /// Run of host code tokens
    HOST_CODE,
    /// `@name tokens... { body }`
    DIRECTIVE,
    /// Content between the braces of a block directive
    DIRECTIVE_BODY,
    /// Wrapper around a template comment token
    COMMENT,

    /// Error recovery node
    ERROR,
}

impl SyntaxKind {
    /// Returns true if this kind represents a token (lexer output).
    pub fn is_token(self) -> bool {
        (self as u16) <= (Self::EOF as u16)
    }

    /// Returns true if this kind represents a composite node.
    pub fn is_node(self) -> bool {
        !self.is_token()
    }

    /// Returns true if this kind is trivia (whitespace/newlines).
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::WHITESPACE | Self::NEWLINE)
    }

    /// Returns true for tokens produced by the host code tokenizer.
    pub fn is_host_token(self) -> bool {
        (Self::IDENT as u16..=Self::UNKNOWN as u16).contains(&(self as u16))
    }

    /// Returns true for tokens produced by the markup tokenizer.
    pub fn is_markup_token(self) -> bool {
        (Self::TEXT as u16..=Self::SQUOTE as u16).contains(&(self as u16))
            || self == Self::ESCAPED_TRANSITION
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

/// Language definition for rowan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QuillLang {}

impl rowan::Language for QuillLang {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 <= SyntaxKind::ERROR as u16);
        // SAFETY: We check bounds above and SyntaxKind is repr(u16)
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type alias for our syntax nodes.
pub type SyntaxNode = rowan::SyntaxNode<QuillLang>;
/// Type alias for our syntax tokens.
pub type SyntaxToken = rowan::SyntaxToken<QuillLang>;
/// Type alias for syntax elements (node or token).
pub type SyntaxElement = rowan::SyntaxElement<QuillLang>;
