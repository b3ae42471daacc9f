use relative_path::{Component, RelativePathBuf};

use super::directive::skeleton;
use super::{Pass, PassCategory, PassContext, PassError, Prerequisite};
use crate::ir::{IrNode, Symbol};

const DEFAULT_CLASS: &str = "Template";
const DEFAULT_METHOD: &str = "ExecuteAsync";

/// Fills in whatever the directives left unset: the namespace comes from
/// the root namespace plus the document's directories, the class name from
/// its file stem.
pub struct DefaultDocumentClassifierPass;

impl Pass for DefaultDocumentClassifierPass {
    fn name(&self) -> &'static str {
        "DefaultDocumentClassifierPass"
    }

    fn category(&self) -> PassCategory {
        PassCategory::DocumentClassifier
    }

    fn order(&self) -> i32 {
        100
    }

    fn prerequisites(&self) -> &'static [Prerequisite] {
        &[Prerequisite::Category(PassCategory::Lowering)]
    }

    fn execute(&self, ctx: &mut PassContext<'_>) -> Result<(), PassError> {
        let (namespace, class, method) = skeleton(ctx.ir)?;
        let (directories, stem) = ctx.source.path().map(split_path).unwrap_or_default();

        if let IrNode::Namespace { name } = ctx.ir.node_mut(namespace)
            && name.is_none()
        {
            let full = std::iter::once(ctx.options.root_namespace.clone())
                .chain(directories)
                .filter(|segment| !segment.is_empty())
                .collect::<Vec<_>>()
                .join(".");
            *name = Some(Symbol::synthetic(full));
        }

        if let IrNode::Class {
            name, base_type, ..
        } = ctx.ir.node_mut(class)
        {
            if name.is_empty() {
                *name = stem.unwrap_or_else(|| DEFAULT_CLASS.to_string());
            }
            if base_type.is_none() {
                *base_type = Some(Symbol::synthetic(ctx.options.base_type.clone()));
            }
        }

        if let IrNode::Method { name } = ctx.ir.node_mut(method)
            && name.is_empty()
        {
            *name = DEFAULT_METHOD.to_string();
        }
        Ok(())
    }
}

/// Sanitized directory segments and file stem of a document path.
fn split_path(path: &str) -> (Vec<String>, Option<String>) {
    let path = path.replace('\\', "/");
    let relative = RelativePathBuf::from(path.trim_start_matches('/')).normalize();
    let stem = relative.file_stem().map(identifier);
    let directories = relative
        .parent()
        .map(|parent| {
            parent
                .components()
                .filter_map(|component| match component {
                    Component::Normal(segment) => Some(identifier(segment)),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();
    (directories, stem)
}

/// Replaces characters that cannot appear in an identifier with `_`.
fn identifier(segment: &str) -> String {
    let mut out = segment
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect::<String>();
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::IrTree;
    use crate::passes::tests::{Harness, run_through};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn names(ir: &IrTree) -> (String, String, Option<String>, String) {
        let namespace = match ir.namespace().map(|id| ir.node(id)) {
            Some(IrNode::Namespace { name: Some(name) }) => name.text.clone(),
            _ => String::new(),
        };
        let (class, base) = match ir.class().map(|id| ir.node(id)) {
            Some(IrNode::Class {
                name, base_type, ..
            }) => (name.clone(), base_type.as_ref().map(|b| b.text.clone())),
            _ => (String::new(), None),
        };
        let method = match ir.method().map(|id| ir.node(id)) {
            Some(IrNode::Method { name }) => name.clone(),
            _ => String::new(),
        };
        (namespace, class, base, method)
    }

    #[test]
    fn defaults_come_from_path_and_options() {
        let harness = Harness::new("<p></p>");
        let ir = run_through(&harness, &["DefaultDocumentClassifierPass"]);
        assert_eq!(
            names(&ir),
            (
                "Quill.Pages".to_string(),
                "Index".to_string(),
                Some("global::Quill.TemplateBase".to_string()),
                "ExecuteAsync".to_string()
            )
        );
    }

    #[test]
    fn directives_take_precedence() {
        let harness = Harness::new("@namespace Shop.Views\n@inherits CartPage\n");
        let ir = run_through(
            &harness,
            &["DirectiveStructurePass", "DefaultDocumentClassifierPass"],
        );
        let (namespace, _, base, _) = names(&ir);
        assert_eq!(namespace, "Shop.Views");
        assert_eq!(base.as_deref(), Some("CartPage"));
    }

    #[rstest]
    #[case("Index.qtml", &[], Some("Index"))]
    #[case("/Views/Shared/_Layout.qtml", &["Views", "Shared"], Some("_Layout"))]
    #[case("Areas\\Admin\\2fa-setup.qtml", &["Areas", "Admin"], Some("_2fa_setup"))]
    #[case("a/../b/./c.qtml", &["b"], Some("c"))]
    fn path_segments(
        #[case] path: &str,
        #[case] directories: &[&str],
        #[case] stem: Option<&str>,
    ) {
        let (actual_directories, actual_stem) = split_path(path);
        assert_eq!(actual_directories, directories);
        assert_eq!(actual_stem.as_deref(), stem);
    }
}
