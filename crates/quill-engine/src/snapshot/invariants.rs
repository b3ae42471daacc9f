use crate::codegen::TargetKind;
use crate::document::CodeDocument;
use crate::mapping::map_to_original;

pub fn check(document: &CodeDocument) {
    let source = document.source();
    let n = source.len();

    assert_eq!(
        document.syntax_tree().root().text().to_string(),
        source.text(),
        "syntax tree does not reproduce its source"
    );

    for diagnostic in document.diagnostics() {
        if diagnostic.span.file_path.as_deref() == source.path() {
            assert!(
                diagnostic.span.end() <= n,
                "diagnostic span out of bounds: {:?} (source len: {})",
                diagnostic.span,
                n
            );
        }
    }

    for kind in TargetKind::ALL {
        let generated = document.generated_document(kind);
        let len = generated.text().len();
        let mappings = generated.mappings();

        for pair in mappings.windows(2) {
            assert!(
                pair[0].generated.end() <= pair[1].generated.absolute_index,
                "{kind} mappings unsorted or overlapping: {:?} then {:?}",
                pair[0].generated.range(),
                pair[1].generated.range()
            );
        }
        for mapping in mappings {
            assert!(
                mapping.generated.end() <= len,
                "{kind} generated span out of bounds: {:?} (len: {})",
                mapping.generated.range(),
                len
            );
            assert!(
                mapping.original.end() <= n,
                "{kind} original span out of bounds: {:?} (source len: {})",
                mapping.original.range(),
                n
            );
            assert_eq!(
                map_to_original(generated, source, mapping.generated.range()).as_ref(),
                Some(&mapping.original),
                "{kind} mapping does not round-trip"
            );
        }
    }
}
