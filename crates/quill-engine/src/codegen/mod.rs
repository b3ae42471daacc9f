//! # Code Writers
//!
//! Renders the IR into one [`GeneratedDocument`] per [`TargetKind`]. Each
//! target has its own [`CodeWriter`]: an output buffer plus the mapping
//! entries recorded while writing it.
//!
//! A mapping entry pairs a generated range with the original [`SourceSpan`]
//! of the IR node that produced it. Only nodes with a span record entries;
//! boilerplate is generated-only.

mod host;
mod markup;

use std::fmt;
use std::ops::Range;

use serde::Serialize;

use crate::diagnostics::Diagnostic;
use crate::error::CompileError;
use crate::ir::IrTree;
use crate::source::{SourceSpan, SourceText};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum TargetKind {
    /// C#-like code that executes the template.
    Host,
    /// The template's markup with host code blanked out.
    Markup,
}

impl TargetKind {
    pub const ALL: [TargetKind; 2] = [TargetKind::Host, TargetKind::Markup];

    /// Suffix appended to the document path for the generated file.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Host => ".g.cs",
            Self::Markup => ".g.html",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => f.pad("host"),
            Self::Markup => f.pad("markup"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SourceMapping {
    pub generated: SourceSpan,
    pub original: SourceSpan,
}

/// One rendered output with its mapping table, sorted by generated offset
/// and free of overlaps.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    kind: TargetKind,
    text: SourceText,
    mappings: Vec<SourceMapping>,
    /// Indices into `mappings`, ordered by original offset.
    by_original: Vec<usize>,
    /// Furthest original end among `by_original[..=i]`.
    reach: Vec<usize>,
    diagnostics: Vec<Diagnostic>,
}

impl GeneratedDocument {
    /// Sorts the recorded entries and rejects overlapping generated ranges.
    pub fn new(
        kind: TargetKind,
        path: Option<&str>,
        text: String,
        mut entries: Vec<(Range<usize>, SourceSpan)>,
        diagnostics: Vec<Diagnostic>,
    ) -> Result<Self, CompileError> {
        let text = match path {
            Some(path) => SourceText::with_path(format!("{path}{}", kind.extension()), &text),
            None => SourceText::new(&text),
        };

        entries.sort_by_key(|(range, _)| (range.start, range.end));
        if let Some(pair) = entries
            .windows(2)
            .find(|pair| pair[0].0.end > pair[1].0.start)
        {
            return Err(CompileError::InvalidMappings(format!(
                "{kind} entries {:?} and {:?} overlap",
                pair[0].0, pair[1].0
            )));
        }

        let mappings = entries
            .into_iter()
            .map(|(range, original)| {
                log::trace!("{kind} mapping {range:?} -> {:?}", original.range());
                Ok(SourceMapping {
                    generated: text.span(range)?,
                    original,
                })
            })
            .collect::<Result<Vec<_>, CompileError>>()?;

        let mut by_original = (0..mappings.len()).collect::<Vec<_>>();
        by_original.sort_by_key(|&i| {
            let original = &mappings[i].original;
            (original.absolute_index, original.end())
        });
        let reach = by_original
            .iter()
            .scan(0, |reach, &i| {
                *reach = mappings[i].original.end().max(*reach);
                Some(*reach)
            })
            .collect();

        Ok(Self {
            kind,
            text,
            mappings,
            by_original,
            reach,
            diagnostics,
        })
    }

    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    pub fn text(&self) -> &SourceText {
        &self.text
    }

    pub fn mappings(&self) -> &[SourceMapping] {
        &self.mappings
    }

    /// Mappings whose original span could hold `range`, ordered by original
    /// offset. Original spans may nest, so callers still filter.
    pub fn mappings_around_original(
        &self,
        range: Range<usize>,
    ) -> impl Iterator<Item = &SourceMapping> + Clone {
        let end = self
            .by_original
            .partition_point(|&i| self.mappings[i].original.absolute_index <= range.start);
        let start = self.reach[..end].partition_point(|&reach| reach < range.end);
        self.by_original[start..end]
            .iter()
            .map(|&i| &self.mappings[i])
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// Output buffer that tracks indentation and records mapping entries as
/// mapped text is appended.
#[derive(Debug, Default)]
pub struct CodeWriter {
    out: String,
    indent: usize,
    at_line_start: bool,
    entries: Vec<(Range<usize>, SourceSpan)>,
    diagnostics: Vec<Diagnostic>,
}

const INDENT: &str = "    ";

impl CodeWriter {
    pub fn new() -> Self {
        Self {
            at_line_start: true,
            ..Self::default()
        }
    }

    pub fn position(&self) -> usize {
        self.out.len()
    }

    pub fn indent(&mut self) -> &mut Self {
        self.indent += 1;
        self
    }

    pub fn dedent(&mut self) -> &mut Self {
        self.indent = self.indent.saturating_sub(1);
        self
    }

    fn pad(&mut self) {
        if self.at_line_start {
            for _ in 0..self.indent {
                self.out.push_str(INDENT);
            }
            self.at_line_start = false;
        }
    }

    /// Appends text verbatim, indenting if at the start of a line.
    pub fn write(&mut self, text: &str) -> &mut Self {
        if text.is_empty() {
            return self;
        }
        self.pad();
        self.out.push_str(text);
        self.at_line_start = text.ends_with('\n');
        self
    }

    pub fn write_line(&mut self, text: &str) -> &mut Self {
        self.write(text);
        self.new_line()
    }

    pub fn new_line(&mut self) -> &mut Self {
        self.out.push('\n');
        self.at_line_start = true;
        self
    }

    /// Appends text and, when `span` is set, maps the appended range to it.
    pub fn write_mapped(&mut self, text: &str, span: Option<&SourceSpan>) -> &mut Self {
        if text.is_empty() {
            return self;
        }
        self.pad();
        let start = self.position();
        self.out.push_str(text);
        self.at_line_start = text.ends_with('\n');
        if let Some(span) = span {
            self.entries.push((start..self.position(), span.clone()));
        }
        self
    }

    /// Records a problem with the output itself.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Pads with spaces up to `offset`, keeping newlines from `source`.
    pub(crate) fn pad_to(&mut self, offset: usize, source: &str) {
        let start = self.position();
        if offset <= start {
            return;
        }
        let filled = match source.get(start..offset) {
            // one space per byte so offsets stay aligned with the source
            Some(gap) => gap
                .chars()
                .map(|c| match c {
                    '\n' | '\r' => c.to_string(),
                    _ => " ".repeat(c.len_utf8()),
                })
                .collect::<String>(),
            None => " ".repeat(offset - start),
        };
        self.out.push_str(&filled);
        self.at_line_start = filled.ends_with('\n');
    }

    pub fn finish(self) -> (String, Vec<(Range<usize>, SourceSpan)>) {
        (self.out, self.entries)
    }
}

/// Renders `ir` for one target.
pub fn generate(
    source: &SourceText,
    ir: &IrTree,
    kind: TargetKind,
) -> Result<GeneratedDocument, CompileError> {
    log::debug!("writing {kind} document");
    let mut writer = match kind {
        TargetKind::Host => host::write(ir),
        TargetKind::Markup => markup::write(source, ir),
    };
    let diagnostics = writer.take_diagnostics();
    let (text, entries) = writer.finish();
    GeneratedDocument::new(kind, source.path(), text, entries, diagnostics)
}
