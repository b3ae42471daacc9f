//! The host document: a C#-like class whose render method replays the
//! template. Source-derived code is written verbatim and mapped; markup
//! becomes string literals, which are generated-only.

use super::CodeWriter;
use crate::directives::DirectiveTokenKind;
use crate::ir::{IrNode, IrTree, NodeId, Symbol};

const INJECT_ATTRIBUTE: &str = "[global::Quill.Inject]";
const TASK: &str = "global::System.Threading.Tasks.Task";

struct HostWriter<'a> {
    ir: &'a IrTree,
    w: CodeWriter,
}

pub(super) fn write(ir: &IrTree) -> CodeWriter {
    let mut writer = HostWriter {
        ir,
        w: CodeWriter::new(),
    };
    writer.w.write_line("// <auto-generated/>");
    writer.w.write_line("#pragma warning disable 1591");
    for &child in ir.children(ir.root()) {
        writer.top_level(child);
    }
    writer.w.write_line("#pragma warning restore 1591");
    writer.w
}

/// Escapes text for a regular C# string literal.
fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

impl HostWriter<'_> {
    fn symbol(&mut self, symbol: &Symbol) {
        self.w.write_mapped(&symbol.text, symbol.span.as_ref());
    }

    fn top_level(&mut self, id: NodeId) {
        let ir = self.ir;
        match ir.node(id) {
            IrNode::Namespace { name } => {
                self.w.write("namespace ");
                match name {
                    Some(name) => self.symbol(name),
                    None => {
                        self.w.write("Quill");
                    }
                }
                self.w.new_line().write_line("{").indent();
                for &child in ir.children(id) {
                    self.top_level(child);
                }
                self.w.dedent().write_line("}");
            }
            IrNode::Using { namespace } => {
                self.w.write("using ");
                self.symbol(namespace);
                self.w.write_line(";");
            }
            IrNode::Class { .. } => self.class(id),
            _ => self.content(id),
        }
    }

    fn class(&mut self, id: NodeId) {
        let ir = self.ir;
        let IrNode::Class {
            name,
            base_type,
            model,
        } = ir.node(id)
        else {
            return;
        };
        self.w.write("public class ").write(name);
        if let Some(base_type) = base_type {
            self.w.write(" : ");
            self.symbol(base_type);
            if let Some(model) = model {
                self.w.write("<");
                self.symbol(model);
                self.w.write(">");
            }
        }
        self.w.new_line().write_line("{").indent();
        for &member in ir.children(id) {
            self.member(member);
        }
        self.w.dedent().write_line("}");
    }

    fn member(&mut self, id: NodeId) {
        let ir = self.ir;
        match ir.node(id) {
            IrNode::DesignTimeDirectives => self.design_time(id),
            IrNode::Property { type_name, member } => {
                self.w.write(INJECT_ATTRIBUTE).write(" public ");
                self.symbol(type_name);
                self.w.write(" ");
                self.symbol(member);
                self.w.write_line(" { get; private set; } = default!;");
            }
            IrNode::HostCode { code } => {
                self.w.write_mapped(code, ir.span(id));
                self.w.new_line();
            }
            IrNode::Method { name } => {
                self.w.write_line("#pragma warning disable 1998");
                self.w
                    .write("public async override ")
                    .write(TASK)
                    .write(" ")
                    .write(name)
                    .write_line("()");
                self.w.write_line("{").indent();
                for &child in ir.children(id) {
                    self.content(child);
                }
                self.w.dedent().write_line("}");
                self.w.write_line("#pragma warning restore 1998");
            }
            _ => self.content(id),
        }
    }

    /// Directive tokens as throwaway locals, so host tooling can resolve
    /// the types and names they mention.
    fn design_time(&mut self, id: NodeId) {
        let ir = self.ir;
        self.w.write_line("#pragma warning disable 0219");
        self.w.write_line("private void __DesignTimeHelpers()");
        self.w.write_line("{").indent();
        for (index, &token) in ir.children(id).iter().enumerate() {
            let IrNode::DirectiveToken { kind, text } = ir.node(token) else {
                continue;
            };
            let span = ir.span(token);
            let helper = format!("__typeHelper{index}");
            match kind {
                DirectiveTokenKind::Type => {
                    self.w.write_mapped(text, span);
                    self.w.write(" ").write(&helper).write_line(" = default!;");
                }
                DirectiveTokenKind::Namespace => {
                    self.w
                        .write("global::System.Object ")
                        .write(&helper)
                        .write(" = nameof(");
                    self.w.write_mapped(text, span);
                    self.w.write_line(");");
                }
                DirectiveTokenKind::Member => {
                    self.w.write("global::System.Object ");
                    self.w.write_mapped(text, span);
                    self.w.write_line(" = null!;");
                }
                DirectiveTokenKind::String => {
                    self.w
                        .write("global::System.Object ")
                        .write(&helper)
                        .write(" = ");
                    self.w.write_mapped(text, span);
                    self.w.write_line(";");
                }
            }
        }
        self.w.dedent().write_line("}");
        self.w.write_line("#pragma warning restore 0219");
    }

    fn content(&mut self, id: NodeId) {
        let ir = self.ir;
        match ir.node(id) {
            IrNode::MarkupContent { text } => {
                self.w
                    .write("WriteLiteral(")
                    .write(&string_literal(text))
                    .write_line(");");
            }
            IrNode::HostExpression { code } => {
                self.w.write("Write(");
                self.w.write_mapped(code, ir.span(id));
                self.w.write_line(");");
            }
            IrNode::HostCode { code } => {
                self.w.write_mapped(code, ir.span(id));
                self.w.new_line();
            }
            IrNode::MarkupAttribute {
                name,
                prefix,
                suffix,
            } => {
                self.w.write_line(&format!(
                    "BeginWriteAttribute({}, {}, {});",
                    string_literal(name),
                    string_literal(&prefix.text),
                    string_literal(&suffix.text)
                ));
                for &part in ir.children(id) {
                    self.attribute_value(part);
                }
                self.w.write_line("EndWriteAttribute();");
            }
            IrNode::Section { name } => {
                self.w.write("DefineSection(\"");
                self.symbol(name);
                self.w.write_line("\", async () =>");
                self.w.write_line("{").indent();
                for &child in ir.children(id) {
                    self.content(child);
                }
                self.w.dedent().write_line("});");
            }
            IrNode::Directive { .. } => {
                for &child in ir.children(id) {
                    self.content(child);
                }
            }
            IrNode::Document => {
                for &child in ir.children(id) {
                    self.top_level(child);
                }
            }
            IrNode::Namespace { .. }
            | IrNode::Using { .. }
            | IrNode::Class { .. }
            | IrNode::Method { .. }
            | IrNode::Property { .. }
            | IrNode::DesignTimeDirectives => self.member(id),
            IrNode::DirectiveToken { .. } | IrNode::MalformedDirective { .. } => {}
        }
    }

    fn attribute_value(&mut self, id: NodeId) {
        let ir = self.ir;
        match ir.node(id) {
            IrNode::MarkupContent { text } => {
                self.w
                    .write("WriteAttributeValue(")
                    .write(&string_literal(text))
                    .write_line(");");
            }
            IrNode::HostExpression { code } => {
                self.w.write("WriteAttributeValue(");
                self.w.write_mapped(code, ir.span(id));
                self.w.write_line(");");
            }
            _ => self.content(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::TargetKind;
    use crate::document::{CompileOptions, create_code_document};
    use crate::source::SourceText;
    use pretty_assertions::assert_eq;

    fn host(text: &str) -> String {
        let document = create_code_document(
            SourceText::with_path("Pages/Index.qtml", text),
            Vec::new(),
            &CompileOptions::default(),
        )
        .expect("compiles");
        document.generated_document(TargetKind::Host).text().text()
    }

    #[test]
    fn string_literals_are_escaped() {
        assert_eq!(string_literal("a\"b\\c\n"), r#""a\"b\\c\n""#);
    }

    #[test]
    fn simple_template() {
        insta::assert_snapshot!(host("<p>@name</p>"), @r#"
        // <auto-generated/>
        #pragma warning disable 1591
        namespace Quill.Pages
        {
            public class Index : global::Quill.TemplateBase
            {
                #pragma warning disable 1998
                public async override global::System.Threading.Tasks.Task ExecuteAsync()
                {
                    WriteLiteral("<p>");
                    Write(name);
                    WriteLiteral("</p>");
                }
                #pragma warning restore 1998
            }
        }
        #pragma warning restore 1591
        "#);
    }

    #[test]
    fn directives_shape_the_class() {
        let text = "@using System.Linq\n@inherits Page\n@model Cart\n@inject ILogger Log\n<b>@Model.Total</b>";
        let generated = host(text);
        assert!(generated.contains("using System.Linq;"));
        assert!(generated.contains("public class Index : Page<Cart>"));
        assert!(generated.contains("[global::Quill.Inject] public ILogger Log { get; private set; } = default!;"));
        assert!(generated.contains("Write(Model.Total);"));
        assert!(!generated.contains("__DesignTimeHelpers"));
    }

    #[test]
    fn section_and_attribute() {
        let generated = host("<a href=\"/u/@id\">x</a>\n@section Scripts {\n<script></script>\n}\n");
        assert!(generated.contains("BeginWriteAttribute(\"href\", \"href=\\\"\", \"\\\"\");"));
        assert!(generated.contains("WriteAttributeValue(\"/u/\");"));
        assert!(generated.contains("WriteAttributeValue(id);"));
        assert!(generated.contains("DefineSection(\"Scripts\", async () =>"));
    }
}
