use serde::Serialize;

use crate::codegen::TargetKind;
use crate::document::CodeDocument;
use crate::source::preview;

const PREVIEW: usize = 40;

#[derive(Debug, Serialize)]
pub struct Snap {
    pub documents: Vec<GeneratedSnap>,
    pub diagnostics: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct GeneratedSnap {
    pub kind: TargetKind,
    pub text: String,
    pub mappings: Vec<MappingSnap>,
}

#[derive(Debug, Serialize)]
pub struct MappingSnap {
    pub generated: (usize, usize),
    pub original: (usize, usize),
    pub text: String,
}

pub fn normalize(document: &CodeDocument) -> Snap {
    let documents = TargetKind::ALL
        .into_iter()
        .map(|kind| {
            let generated = document.generated_document(kind);
            let mappings = generated
                .mappings()
                .iter()
                .map(|m| MappingSnap {
                    generated: (m.generated.absolute_index, m.generated.end()),
                    original: (m.original.absolute_index, m.original.end()),
                    text: preview(document.source().rope(), m.original.range(), PREVIEW),
                })
                .collect();
            GeneratedSnap {
                kind,
                text: generated.text().text(),
                mappings,
            }
        })
        .collect();

    let diagnostics = document
        .diagnostics()
        .iter()
        .map(ToString::to_string)
        .collect();

    Snap {
        documents,
        diagnostics,
    }
}
