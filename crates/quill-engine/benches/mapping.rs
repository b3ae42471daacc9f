use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use quill_engine::{
    CompileOptions, DefaultDocumentMappingService, DocumentMappingService, SourceText,
    TargetKind, create_code_document,
};
mod common;

fn bench_mapping_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("mapping");
    group.sample_size(20);

    let text = common::generate_template(200);
    let document = create_code_document(
        SourceText::with_path("Pages/Catalog.qtml", &text),
        Vec::new(),
        &CompileOptions::default(),
    )
    .unwrap();
    let service = DefaultDocumentMappingService;
    let host = document.generated_document(TargetKind::Host);
    let ranges = host
        .mappings()
        .iter()
        .map(|m| m.generated.range())
        .collect::<Vec<_>>();
    let offsets = (0..text.len()).step_by(97).collect::<Vec<_>>();

    group.bench_function("to_original", |b| {
        b.iter(|| {
            for range in &ranges {
                let mapped =
                    service.try_map_to_original_range(&document, TargetKind::Host, range.clone());
                black_box(mapped);
            }
        });
    });

    group.bench_function("to_generated", |b| {
        b.iter(|| {
            for &offset in &offsets {
                let mapped = service.try_map_to_generated_range(
                    &document,
                    TargetKind::Host,
                    offset..offset + 1,
                );
                black_box(mapped);
            }
        });
    });

    group.bench_function("language_kind", |b| {
        b.iter(|| {
            for &offset in &offsets {
                black_box(service.get_language_kind(&document, offset, true));
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_mapping_queries);
criterion_main!(benches);
