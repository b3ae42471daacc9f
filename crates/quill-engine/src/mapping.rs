//! # Document Mapping
//!
//! Translates ranges between a template and its generated documents, and
//! classifies template offsets by language. All queries are pure reads over
//! a finished [`CodeDocument`].
//!
//! ## Strict containment
//!
//! A range maps only when it lies entirely inside **one** mapping entry.
//! A range that straddles two entries, or touches generated-only text, does
//! not map. When an entry's generated and original texts differ in length
//! (such as `@@` written as `@`), only the entry's exact range maps.
//!
//! ## Language kind
//!
//! [`DocumentMappingService::get_language_kind`] looks for the smallest
//! original span, across both generated documents, that contains the offset
//! (both ends inclusive). At a boundary between two spans `right_associative`
//! picks the span starting at the offset; otherwise the one ending there.
//! Offsets no entry covers are classified from the syntax token at that
//! offset.

use std::ops::Range;

use quill_syntax::{SyntaxKind, SyntaxToken, TextSize, TokenAtOffset};
use serde::Serialize;

use crate::codegen::{GeneratedDocument, SourceMapping, TargetKind};
use crate::document::CodeDocument;
use crate::source::{SourceSpan, SourceText};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LanguageKind {
    /// The host expression/statement language.
    Host,
    Markup,
    /// Template syntax itself: transitions, directive names, comments.
    Template,
}

pub trait DocumentMappingService {
    /// The original span for a generated range, if the range lies inside a
    /// single mapping entry.
    fn try_map_to_original_range(
        &self,
        document: &CodeDocument,
        kind: TargetKind,
        generated: Range<usize>,
    ) -> Option<SourceSpan>;

    /// The generated span for an original range, if the range lies inside a
    /// single mapping entry.
    fn try_map_to_generated_range(
        &self,
        document: &CodeDocument,
        kind: TargetKind,
        original: Range<usize>,
    ) -> Option<SourceSpan>;

    fn get_language_kind(
        &self,
        document: &CodeDocument,
        offset: usize,
        right_associative: bool,
    ) -> LanguageKind;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDocumentMappingService;

impl DocumentMappingService for DefaultDocumentMappingService {
    fn try_map_to_original_range(
        &self,
        document: &CodeDocument,
        kind: TargetKind,
        generated: Range<usize>,
    ) -> Option<SourceSpan> {
        map_to_original(
            document.generated_document(kind),
            document.source(),
            generated,
        )
    }

    fn try_map_to_generated_range(
        &self,
        document: &CodeDocument,
        kind: TargetKind,
        original: Range<usize>,
    ) -> Option<SourceSpan> {
        map_to_generated(document.generated_document(kind), original)
    }

    fn get_language_kind(
        &self,
        document: &CodeDocument,
        offset: usize,
        right_associative: bool,
    ) -> LanguageKind {
        let host = touching(document.generated_document(TargetKind::Host), offset)
            .map(|m| (LanguageKind::Host, m));
        let markup = touching(document.generated_document(TargetKind::Markup), offset)
            .map(|m| (LanguageKind::Markup, m));
        match innermost(host.chain(markup), offset, right_associative) {
            Some((language, _)) => language,
            None => classify_token(document, offset, right_associative),
        }
    }
}

/// Maps a generated range back through the single entry containing it.
pub fn map_to_original(
    generated: &GeneratedDocument,
    source: &SourceText,
    range: Range<usize>,
) -> Option<SourceSpan> {
    if range.start > range.end {
        return None;
    }
    let mappings = generated.mappings();
    // entries are sorted and disjoint: only the last one starting at or
    // before the range can contain it
    let index = mappings
        .partition_point(|m| m.generated.absolute_index <= range.start)
        .checked_sub(1)?;
    let entry = &mappings[index];
    if !entry.generated.contains(&range) {
        return None;
    }
    translate(entry, &entry.generated, &entry.original, range, source)
}

/// Maps an original range forward through the smallest entry containing it.
pub fn map_to_generated(generated: &GeneratedDocument, range: Range<usize>) -> Option<SourceSpan> {
    if range.start > range.end {
        return None;
    }
    let entry = generated
        .mappings_around_original(range.clone())
        .filter(|m| m.original.contains(&range))
        .min_by_key(|m| m.original.length)?;
    translate(entry, &entry.original, &entry.generated, range, generated.text())
}

fn translate(
    entry: &SourceMapping,
    from: &SourceSpan,
    to: &SourceSpan,
    range: Range<usize>,
    target: &SourceText,
) -> Option<SourceSpan> {
    if entry.generated.length == entry.original.length {
        let start = to.absolute_index + (range.start - from.absolute_index);
        target.span(start..start + range.len()).ok()
    } else if from.range() == range {
        Some(to.clone())
    } else {
        None
    }
}

/// Entries whose original span holds `offset`, both ends inclusive.
fn touching(
    generated: &GeneratedDocument,
    offset: usize,
) -> impl Iterator<Item = &SourceMapping> + Clone {
    generated
        .mappings_around_original(offset..offset)
        .filter(move |m| m.original.touches(offset))
}

/// The smallest candidate, after dropping those that only meet `offset`
/// from the wrong side. If that drops everything, the boundary entries
/// count after all.
fn innermost<'a, T>(
    candidates: impl Iterator<Item = (T, &'a SourceMapping)> + Clone,
    offset: usize,
    right_associative: bool,
) -> Option<(T, &'a SourceMapping)> {
    let wrong_side = |m: &SourceMapping| {
        !m.original.is_empty()
            && if right_associative {
                m.original.end() == offset
            } else {
                m.original.absolute_index == offset
            }
    };
    candidates
        .clone()
        .filter(|(_, m)| !wrong_side(m))
        .min_by_key(|(_, m)| m.original.length)
        .or_else(|| candidates.min_by_key(|(_, m)| m.original.length))
}

/// The entry whose original span holds `offset`, preferring the innermost
/// one. At a boundary between two entries `right_associative` picks the
/// one starting at `offset`.
pub fn entry_at_original(
    generated: &GeneratedDocument,
    offset: usize,
    right_associative: bool,
) -> Option<&SourceMapping> {
    let candidates = touching(generated, offset).map(|m| ((), m));
    innermost(candidates, offset, right_associative).map(|(_, m)| m)
}

fn classify_token(document: &CodeDocument, offset: usize, right_associative: bool) -> LanguageKind {
    if offset > document.source().len() {
        return LanguageKind::Template;
    }
    let Ok(offset) = u32::try_from(offset) else {
        return LanguageKind::Template;
    };
    let root = document.syntax_tree().root();
    let token = match root.token_at_offset(TextSize::from(offset)) {
        TokenAtOffset::None => return LanguageKind::Template,
        TokenAtOffset::Single(token) => token,
        TokenAtOffset::Between(left, right) => {
            if right_associative {
                right
            } else {
                left
            }
        }
    };
    token_language(&token)
}

fn token_language(token: &SyntaxToken) -> LanguageKind {
    let parent = token.parent().map(|p| p.kind());
    match token.kind() {
        SyntaxKind::TRANSITION | SyntaxKind::TEMPLATE_COMMENT => LanguageKind::Template,
        _ if parent == Some(SyntaxKind::HOST_CODE) => LanguageKind::Host,
        kind if kind.is_markup_token() => LanguageKind::Markup,
        _ if matches!(
            parent,
            Some(
                SyntaxKind::MARKUP_BLOCK
                    | SyntaxKind::MARKUP_START_TAG
                    | SyntaxKind::MARKUP_END_TAG
                    | SyntaxKind::MARKUP_ATTRIBUTE
                    | SyntaxKind::MARKUP_ATTRIBUTE_VALUE
            )
        ) =>
        {
            LanguageKind::Markup
        }
        _ => LanguageKind::Template,
    }
}
