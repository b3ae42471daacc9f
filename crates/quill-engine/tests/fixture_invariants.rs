use std::fs;
use std::path::Path;

use quill_engine::{
    CompileOptions, DefaultDocumentMappingService, DocumentMappingService, SourceText,
    TargetKind, create_code_document, snapshot,
};

/// The parser fixtures double as compiler inputs, valid and broken alike.
const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../quill-syntax/src/fixtures");

fn fixtures() -> Vec<(String, String)> {
    let mut entries = fs::read_dir(FIXTURES)
        .expect("fixture directory")
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "qtml"))
        .collect::<Vec<_>>();
    entries.sort();
    entries
        .iter()
        .map(|path| {
            let name = file_name(path);
            let text = fs::read_to_string(path).expect("fixture text");
            (name, text)
        })
        .collect()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[test]
fn every_fixture_compiles_and_holds_invariants() {
    let fixtures = fixtures();
    assert!(!fixtures.is_empty());
    for (name, text) in fixtures {
        let document = create_code_document(
            SourceText::with_path(name.as_str(), &text),
            Vec::new(),
            &CompileOptions::default(),
        )
        .unwrap_or_else(|error| panic!("{name}: {error}"));
        snapshot::invariants(&document);

        let has_errors = document.has_errors();
        assert_eq!(
            has_errors,
            name.starts_with("error_"),
            "{name}: {:?}",
            document.diagnostics()
        );
    }
}

#[test]
fn language_kind_is_answered_everywhere() {
    let service = DefaultDocumentMappingService;
    for (name, text) in fixtures() {
        let document = create_code_document(
            SourceText::with_path(name.as_str(), &text),
            Vec::new(),
            &CompileOptions::default(),
        )
        .unwrap_or_else(|error| panic!("{name}: {error}"));
        for offset in 0..=text.len() {
            for right_associative in [true, false] {
                service.get_language_kind(&document, offset, right_associative);
            }
        }
    }
}

#[test]
fn markup_document_keeps_line_structure() {
    for (name, text) in fixtures() {
        let document = create_code_document(
            SourceText::with_path(name.as_str(), &text),
            Vec::new(),
            &CompileOptions::default(),
        )
        .unwrap_or_else(|error| panic!("{name}: {error}"));
        let markup = document.generated_document(TargetKind::Markup).text();
        assert_eq!(
            markup.line_count(),
            document.source().line_count(),
            "{name}"
        );
    }
}
