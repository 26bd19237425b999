//! Syntax tree consumed by the declaration pass and the cross-reference resolver.
//!
//! Only the node kinds that matter for cross-referencing get their own variant.
//! Everything else is flattened by the front end: the interesting descendants of an
//! uninteresting node become children of the nearest interesting ancestor, in source
//! order.

use crate::symbol::ClassKind;
use crate::types::Span;

/// A name as written in the source, with the span of the name token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub text: String,
    pub span: Span,
}

impl Ident {
    pub fn new(text: impl Into<String>, span: Span) -> Self {
        Self {
            text: text.into(),
            span,
        }
    }
}

/// One source file: package clause plus top-level nodes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompilationUnit {
    /// Dotted package name, empty for the default package.
    pub package: String,
    pub children: Vec<SyntaxNode>,
}

impl CompilationUnit {
    pub fn imports(&self) -> impl Iterator<Item = &ImportDeclaration> {
        self.children.iter().filter_map(|node| match node {
            SyntaxNode::Import(import) => Some(import),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxNode {
    Import(ImportDeclaration),
    TypeDeclaration(TypeDeclaration),
    MethodDeclaration(MethodDeclaration),
    FieldDeclaration(FieldDeclaration),
    /// A braced block or any other construct introducing a lexical scope.
    Block(Vec<SyntaxNode>),
    /// Members of an anonymous class body, lowered like a block. Calls without a
    /// receiver here target the anonymous class, not the enclosing one.
    AnonymousClassBody(Vec<SyntaxNode>),
    LocalVariable(LocalVariableDeclaration),
    MethodCall(MethodCall),
    ObjectCreation(ObjectCreation),
}

impl SyntaxNode {
    pub fn children(&self) -> &[SyntaxNode] {
        match self {
            Self::Import(_) => &[],
            Self::TypeDeclaration(decl) => &decl.members,
            Self::MethodDeclaration(decl) => &decl.body,
            Self::FieldDeclaration(decl) => &decl.initializers,
            Self::Block(children) | Self::AnonymousClassBody(children) => children,
            Self::LocalVariable(decl) => &decl.initializers,
            Self::MethodCall(call) => &call.children,
            Self::ObjectCreation(creation) => &creation.arguments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDeclaration {
    /// Dotted name without the trailing `.*`.
    pub name: String,
    pub wildcard: bool,
    pub is_static: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDeclaration {
    pub kind: ClassKind,
    pub name: Ident,
    pub doc_comment: Option<String>,
    pub members: Vec<SyntaxNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormalParameter {
    pub name: String,
    /// Declared type as written.
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDeclaration {
    pub name: Ident,
    pub is_constructor: bool,
    pub parameters: Vec<FormalParameter>,
    pub body: Vec<SyntaxNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDeclaration {
    pub type_name: String,
    pub names: Vec<Ident>,
    pub initializers: Vec<SyntaxNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariableDeclaration {
    /// Declared type as written, generic arguments included.
    pub type_name: String,
    pub type_span: Span,
    pub names: Vec<Ident>,
    pub initializers: Vec<SyntaxNode>,
}

/// The expression a method is called on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receiver {
    /// `foo()`
    None,
    /// `this.foo()`
    SelfRef,
    /// `x.foo()` where `x` is a single identifier.
    Name(String),
    /// Any other receiver shape: `a.b.foo()`, `bar().foo()`, `super.foo()`.
    Expression,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub name: Ident,
    pub receiver: Receiver,
    pub argument_count: usize,
    /// Nodes found in the receiver expression, then in the arguments.
    pub children: Vec<SyntaxNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectCreation {
    /// Constructed type as written, generic arguments included.
    pub type_name: String,
    pub type_span: Span,
    pub argument_count: usize,
    /// Nodes found in the arguments and in an anonymous class body.
    pub arguments: Vec<SyntaxNode>,
}

/// Depth-first pre-order walk over `nodes` and all their descendants.
pub fn walk<'a>(nodes: &'a [SyntaxNode], visit: &mut impl FnMut(&'a SyntaxNode)) {
    for node in nodes {
        visit(node);
        walk(node.children(), visit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, children: Vec<SyntaxNode>) -> SyntaxNode {
        SyntaxNode::MethodCall(MethodCall {
            name: Ident::new(name, Span::new(0, name.len() as u32)),
            receiver: Receiver::None,
            argument_count: children.len(),
            children,
        })
    }

    #[test]
    fn test_walk_is_preorder() {
        let tree = vec![
            SyntaxNode::Block(vec![call("outer", vec![call("inner", vec![])])]),
            call("last", vec![]),
        ];

        let mut names = Vec::new();
        walk(&tree, &mut |node| {
            if let SyntaxNode::MethodCall(call) = node {
                names.push(call.name.text.clone());
            }
        });

        assert_eq!(names, vec!["outer", "inner", "last"]);
    }

    #[test]
    fn test_unit_imports() {
        let unit = CompilationUnit {
            package: "p".to_string(),
            children: vec![
                SyntaxNode::Import(ImportDeclaration {
                    name: "q.Foo".to_string(),
                    wildcard: false,
                    is_static: false,
                    span: Span::new(0, 14),
                }),
                SyntaxNode::Block(vec![]),
            ],
        };

        let imports: Vec<_> = unit.imports().map(|i| i.name.as_str()).collect();
        assert_eq!(imports, vec!["q.Foo"]);
    }
}
