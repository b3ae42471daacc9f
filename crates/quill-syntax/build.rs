use std::fmt::Write as _;
use std::path::Path;

/// Generates one test function per .qtml file in src/fixtures/.
/// Each test gets its own name in the runner; files named `error_*` are
/// expected to produce parse errors.
fn main() -> std::io::Result<()> {
    let out_dir = std::env::var("OUT_DIR").map_err(std::io::Error::other)?;
    let dest = Path::new(&out_dir).join("fixture_tests.rs");

    let mut code = String::from(
        r#"mod parse_fixtures {
    use super::fixture_test;
"#,
    );

    let mut entries: Vec<_> = std::fs::read_dir("src/fixtures")?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|path| path.extension().is_some_and(|e| e == "qtml"))
        .collect();
    entries.sort();

    for path in entries {
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let _ = write!(
            code,
            r#"
    #[test]
    fn {name}() {{
        fixture_test(
            "{name}",
            include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/src/fixtures/{name}.qtml")),
        );
    }}
"#
        );
    }

    code.push_str("}\n");
    std::fs::write(&dest, code)?;

    // Rerun if fixtures change
    println!("cargo::rerun-if-changed=src/fixtures");
    Ok(())
}
