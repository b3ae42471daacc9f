// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_template(size: usize) -> String {
    let header = "@using Shop.Models\n@model Catalog\n@inject ILogger<Catalog> Logger\n\n";
    let base = "<section class=\"product\">\n    <h2>@Model.Title</h2>\n    <a href=\"/p/@Model.Id\">details</a>\n    @if (Model.OnSale) {\n        <span>@(Model.Price * 0.9m)</span>\n    }\n    <p>contact: sales@example.com, @@shop</p>\n</section>\n";
    format!("{header}{}", base.repeat(size))
}

#[allow(dead_code)]
pub fn generate_nested_template(depth: usize) -> String {
    let mut content = String::new();
    for level in 0..depth {
        let indent = "    ".repeat(level);
        content.push_str(&format!(
            "{indent}@foreach (var item{level} in items{level}) {{\n{indent}    <li>@item{level}.Name</li>\n"
        ));
    }
    for level in (0..depth).rev() {
        content.push_str(&"    ".repeat(level));
        content.push_str("}\n");
    }
    content
}
