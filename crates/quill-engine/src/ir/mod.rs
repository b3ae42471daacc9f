//! # Intermediate Node Tree
//!
//! The target-independent tree produced by lowering, rewritten in place by
//! passes and walked by the code writers.
//!
//! Nodes live in one arena per document ([`IrTree`]) and refer to each other
//! by [`NodeId`]. Detaching a node only unlinks it from its parent; the slot
//! stays in the arena so ids held by a pass remain valid for the rest of the
//! pass.
//!
//! ```text
//! Document
//! └── Namespace
//!     ├── Using*
//!     └── Class
//!         ├── DesignTimeDirectives?
//!         ├── Property* / HostCode* (members)
//!         └── Method
//!             └── MarkupContent | HostExpression | HostCode | MarkupAttribute | Section ...
//! ```

use std::fmt::Write as _;

use crate::diagnostics::Diagnostic;
use crate::directives::DirectiveTokenKind;
use crate::source::SourceSpan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A name or piece of text that may come from the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    pub text: String,
    pub span: Option<SourceSpan>,
}

impl Symbol {
    pub fn new(text: impl Into<String>, span: Option<SourceSpan>) -> Self {
        Self {
            text: text.into(),
            span,
        }
    }

    /// A symbol with no source origin.
    pub fn synthetic(text: impl Into<String>) -> Self {
        Self::new(text, None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrNode {
    Document,
    Namespace {
        name: Option<Symbol>,
    },
    Using {
        namespace: Symbol,
    },
    Class {
        name: String,
        base_type: Option<Symbol>,
        model: Option<Symbol>,
    },
    Method {
        name: String,
    },
    /// An injected service exposed as a class property.
    Property {
        type_name: Symbol,
        member: Symbol,
    },
    /// Literal markup written as-is.
    MarkupContent {
        text: String,
    },
    /// Attribute whose value contains expressions. Children are the value
    /// parts (`MarkupContent` and `HostExpression`).
    MarkupAttribute {
        name: String,
        prefix: Symbol,
        suffix: Symbol,
    },
    /// Host expression whose value is written to the output.
    HostExpression {
        code: String,
    },
    /// Host statements copied into the generated code.
    HostCode {
        code: String,
    },
    /// A recognised directive. Children are `DirectiveToken`s followed by
    /// the lowered body, if any.
    Directive {
        name: String,
        has_body: bool,
    },
    DirectiveToken {
        kind: DirectiveTokenKind,
        text: String,
    },
    /// A directive that failed validation; carries diagnostics only and
    /// never produces output.
    MalformedDirective {
        name: String,
    },
    Section {
        name: Symbol,
    },
    /// Directive tokens kept for tooling, written as a helper method.
    DesignTimeDirectives,
}

impl IrNode {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Document => "Document",
            Self::Namespace { .. } => "Namespace",
            Self::Using { .. } => "Using",
            Self::Class { .. } => "Class",
            Self::Method { .. } => "Method",
            Self::Property { .. } => "Property",
            Self::MarkupContent { .. } => "MarkupContent",
            Self::MarkupAttribute { .. } => "MarkupAttribute",
            Self::HostExpression { .. } => "HostExpression",
            Self::HostCode { .. } => "HostCode",
            Self::Directive { .. } => "Directive",
            Self::DirectiveToken { .. } => "DirectiveToken",
            Self::MalformedDirective { .. } => "MalformedDirective",
            Self::Section { .. } => "Section",
            Self::DesignTimeDirectives => "DesignTimeDirectives",
        }
    }

    /// One-line summary of the node's payload.
    fn describe(&self) -> String {
        match self {
            Self::Document | Self::DesignTimeDirectives => String::new(),
            Self::Namespace { name } => name.as_ref().map_or(String::new(), |n| n.text.clone()),
            Self::Using { namespace } => namespace.text.clone(),
            Self::Class {
                name,
                base_type,
                model,
            } => {
                let mut s = name.clone();
                if let Some(base) = base_type {
                    let _ = write!(s, " : {}", base.text);
                }
                if let Some(model) = model {
                    let _ = write!(s, " model {}", model.text);
                }
                s
            }
            Self::Method { name } => name.clone(),
            Self::Property { type_name, member } => format!("{} {}", type_name.text, member.text),
            Self::MarkupContent { text } => format!("{text:?}"),
            Self::MarkupAttribute {
                name,
                prefix,
                suffix,
            } => format!("{name} {:?} {:?}", prefix.text, suffix.text),
            Self::HostExpression { code } | Self::HostCode { code } => format!("{code:?}"),
            Self::Directive { name, has_body } => {
                if *has_body {
                    format!("{name} {{}}")
                } else {
                    name.clone()
                }
            }
            Self::DirectiveToken { kind, text } => format!("{kind:?} {text}"),
            Self::MalformedDirective { name } => name.clone(),
            Self::Section { name } => name.text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    pub node: IrNode,
    pub span: Option<SourceSpan>,
    pub diagnostics: Vec<Diagnostic>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

/// Arena-backed IR tree with a `Document` root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrTree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Default for IrTree {
    fn default() -> Self {
        Self::new()
    }
}

impl IrTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                node: IrNode::Document,
                span: None,
                diagnostics: Vec::new(),
                children: Vec::new(),
                parent: None,
            }],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.index()]
    }

    pub fn node(&self, id: NodeId) -> &IrNode {
        &self.get(id).node
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut IrNode {
        &mut self.get_mut(id).node
    }

    pub fn span(&self, id: NodeId) -> Option<&SourceSpan> {
        self.get(id).span.as_ref()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.get(id).children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).parent
    }

    /// Creates a detached node.
    pub fn alloc(&mut self, node: IrNode, span: Option<SourceSpan>) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(NodeData {
            node,
            span,
            diagnostics: Vec::new(),
            children: Vec::new(),
            parent: None,
        });
        id
    }

    /// Appends a new node as the last child of `parent`.
    pub fn push(&mut self, parent: NodeId, node: IrNode, span: Option<SourceSpan>) -> NodeId {
        let id = self.alloc(node, span);
        self.attach(parent, None, id);
        id
    }

    /// Inserts a new node at `index` among `parent`'s children.
    pub fn insert(
        &mut self,
        parent: NodeId,
        index: usize,
        node: IrNode,
        span: Option<SourceSpan>,
    ) -> NodeId {
        let id = self.alloc(node, span);
        self.attach(parent, Some(index), id);
        id
    }

    /// Links a node under `parent`, at `index` or at the end. A node that is
    /// still attached elsewhere is moved.
    pub fn attach(&mut self, parent: NodeId, index: Option<usize>, id: NodeId) {
        self.detach(id);
        let children = &mut self.get_mut(parent).children;
        let index = index.unwrap_or(children.len()).min(children.len());
        children.insert(index, id);
        self.get_mut(id).parent = Some(parent);
    }

    /// Unlinks a node from its parent; its subtree stays intact.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.get_mut(id).parent.take() {
            self.get_mut(parent).children.retain(|&child| child != id);
        }
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    /// Replaces a node with its own children, in place.
    pub fn unwrap_node(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        let Some(mut index) = self.index_in_parent(id) else {
            return;
        };
        for child in self.children(id).to_vec() {
            self.attach(parent, Some(index), child);
            index += 1;
        }
        self.detach(id);
    }

    /// `id` and everything attached below it, in pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev());
        }
        out
    }

    /// First attached node, in pre-order, matching `predicate`.
    pub fn find(&self, predicate: impl Fn(&IrNode) -> bool) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&id| predicate(self.node(id)))
    }

    /// All attached nodes matching `predicate`, in pre-order.
    pub fn find_all(&self, predicate: impl Fn(&IrNode) -> bool) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&id| predicate(self.node(id)))
            .collect()
    }

    pub fn namespace(&self) -> Option<NodeId> {
        self.find(|n| matches!(n, IrNode::Namespace { .. }))
    }

    pub fn class(&self) -> Option<NodeId> {
        self.find(|n| matches!(n, IrNode::Class { .. }))
    }

    pub fn method(&self) -> Option<NodeId> {
        self.find(|n| matches!(n, IrNode::Method { .. }))
    }

    /// Indented outline of the attached tree, one node per line.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(self.root, 0, &mut out);
        out
    }

    fn dump_into(&self, id: NodeId, depth: usize, out: &mut String) {
        let data = self.get(id);
        let _ = write!(out, "{}{}", "  ".repeat(depth), data.node.kind_name());
        let detail = data.node.describe();
        if !detail.is_empty() {
            let _ = write!(out, " {detail}");
        }
        if let Some(span) = &data.span {
            let _ = write!(out, " @{}..{}", span.absolute_index, span.end());
        }
        out.push('\n');
        for &child in &data.children {
            self.dump_into(child, depth + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn span(start: usize, len: usize) -> Option<SourceSpan> {
        Some(SourceSpan::new(None, start, 0, start, len))
    }

    fn literal(text: &str) -> IrNode {
        IrNode::MarkupContent {
            text: text.to_string(),
        }
    }

    #[test]
    fn push_and_insert_keep_order() {
        let mut ir = IrTree::new();
        let root = ir.root();
        let b = ir.push(root, literal("b"), span(1, 1));
        let a = ir.insert(root, 0, literal("a"), span(0, 1));
        assert_eq!(ir.children(root), &[a, b]);
        assert_eq!(ir.parent(a), Some(root));
        assert_eq!(ir.index_in_parent(b), Some(1));
    }

    #[test]
    fn attach_moves_between_parents() {
        let mut ir = IrTree::new();
        let root = ir.root();
        let method = ir.push(root, IrNode::Method { name: "M".into() }, None);
        let text = ir.push(root, literal("x"), span(0, 1));
        ir.attach(method, None, text);
        assert_eq!(ir.children(root), &[method]);
        assert_eq!(ir.children(method), &[text]);
        assert_eq!(ir.parent(text), Some(method));
    }

    #[test]
    fn detached_nodes_leave_traversal() {
        let mut ir = IrTree::new();
        let root = ir.root();
        let a = ir.push(root, literal("a"), None);
        let b = ir.push(root, literal("b"), None);
        ir.detach(a);
        assert_eq!(ir.descendants(root), vec![root, b]);
        assert_eq!(ir.parent(a), None);
    }

    #[test]
    fn unwrap_node_splices_children() {
        let mut ir = IrTree::new();
        let root = ir.root();
        let first = ir.push(root, literal("first"), None);
        let directive = ir.push(
            root,
            IrNode::Directive {
                name: "code".into(),
                has_body: true,
            },
            None,
        );
        let last = ir.push(root, literal("last"), None);
        let x = ir.push(directive, literal("x"), None);
        let y = ir.push(directive, literal("y"), None);

        ir.unwrap_node(directive);

        assert_eq!(ir.children(root), &[first, x, y, last]);
        assert_eq!(ir.parent(x), Some(root));
    }

    #[test]
    fn dump_shows_structure() {
        let mut ir = IrTree::new();
        let root = ir.root();
        let method = ir.push(
            root,
            IrNode::Method {
                name: "ExecuteAsync".into(),
            },
            None,
        );
        ir.push(method, literal("<p>"), span(0, 3));
        ir.push(method, IrNode::HostExpression { code: "x".into() }, span(4, 1));
        insta::assert_snapshot!(ir.dump(), @r#"
        Document
          Method ExecuteAsync
            MarkupContent "<p>" @0..3
            HostExpression "x" @4..5
        "#);
    }
}
