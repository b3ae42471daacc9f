//! `--dump`: generated documents, mapping tables and diagnostics as plain
//! text.

use std::io::Write;

use anyhow::Result;
use quill_engine::{CodeDocument, snapshot};

pub fn write_document(out: &mut impl Write, document: &CodeDocument) -> Result<()> {
    let name = document.source().path().unwrap_or("<memory>");
    let snap = snapshot::normalize(document);

    writeln!(out, "=== {name}")?;
    writeln!(out, "--- diagnostics ({})", snap.diagnostics.len())?;
    for diagnostic in &snap.diagnostics {
        writeln!(out, "{diagnostic}")?;
    }

    for generated in &snap.documents {
        writeln!(out, "--- {} document", generated.kind)?;
        out.write_all(generated.text.as_bytes())?;
        if !generated.text.ends_with('\n') {
            writeln!(out)?;
        }
        writeln!(out, "--- {} mappings ({})", generated.kind, generated.mappings.len())?;
        for mapping in &generated.mappings {
            let (gs, ge) = mapping.generated;
            let (os, oe) = mapping.original;
            writeln!(out, "{gs}..{ge} <- {os}..{oe} {:?}", mapping.text)?;
        }
    }
    Ok(())
}
