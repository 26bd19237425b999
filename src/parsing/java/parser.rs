//! Java front end
//!
//! Lowers the tree-sitter-java concrete syntax tree into [`syntax`](crate::syntax)
//! nodes. Node kinds without a counterpart are flattened: their interesting
//! descendants are lowered in place, in source order.

use crate::parsing::parser::{ParseError, ParseResult, check_recursion_depth};
use crate::symbol::ClassKind;
use crate::syntax::{
    CompilationUnit, FieldDeclaration, FormalParameter, Ident, ImportDeclaration,
    LocalVariableDeclaration, MethodCall, MethodDeclaration, ObjectCreation, Receiver,
    SyntaxNode, TypeDeclaration,
};
use crate::types::Span;
use tree_sitter::{Node, Parser};

// Node type constants from tree-sitter-java grammar
const NODE_PACKAGE_DECLARATION: &str = "package_declaration";
const NODE_IMPORT_DECLARATION: &str = "import_declaration";
const NODE_CLASS_DECLARATION: &str = "class_declaration";
const NODE_INTERFACE_DECLARATION: &str = "interface_declaration";
const NODE_ENUM_DECLARATION: &str = "enum_declaration";
const NODE_ANNOTATION_TYPE_DECLARATION: &str = "annotation_type_declaration";
const NODE_RECORD_DECLARATION: &str = "record_declaration";
const NODE_ENUM_CONSTANT: &str = "enum_constant";
const NODE_METHOD_DECLARATION: &str = "method_declaration";
const NODE_CONSTRUCTOR_DECLARATION: &str = "constructor_declaration";
const NODE_COMPACT_CONSTRUCTOR_DECLARATION: &str = "compact_constructor_declaration";
const NODE_FIELD_DECLARATION: &str = "field_declaration";
const NODE_CONSTANT_DECLARATION: &str = "constant_declaration";
const NODE_LOCAL_VARIABLE_DECLARATION: &str = "local_variable_declaration";
const NODE_FORMAL_PARAMETER: &str = "formal_parameter";
const NODE_SPREAD_PARAMETER: &str = "spread_parameter";
const NODE_VARIABLE_DECLARATOR: &str = "variable_declarator";
const NODE_MODIFIERS: &str = "modifiers";
const NODE_BLOCK: &str = "block";
const NODE_CONSTRUCTOR_BODY: &str = "constructor_body";
const NODE_CLASS_BODY: &str = "class_body";
const NODE_FOR_STATEMENT: &str = "for_statement";
const NODE_ENHANCED_FOR_STATEMENT: &str = "enhanced_for_statement";
const NODE_TRY_WITH_RESOURCES_STATEMENT: &str = "try_with_resources_statement";
const NODE_RESOURCE: &str = "resource";
const NODE_CATCH_CLAUSE: &str = "catch_clause";
const NODE_CATCH_FORMAL_PARAMETER: &str = "catch_formal_parameter";
const NODE_CATCH_TYPE: &str = "catch_type";
const NODE_LAMBDA_EXPRESSION: &str = "lambda_expression";
const NODE_SWITCH_BLOCK: &str = "switch_block";
const NODE_METHOD_INVOCATION: &str = "method_invocation";
const NODE_OBJECT_CREATION_EXPRESSION: &str = "object_creation_expression";
const NODE_THIS: &str = "this";
const NODE_IDENTIFIER: &str = "identifier";
const NODE_SCOPED_IDENTIFIER: &str = "scoped_identifier";
const NODE_BLOCK_COMMENT: &str = "block_comment";
const NODE_LINE_COMMENT: &str = "line_comment";

/// Parser for Java source files
pub struct JavaParser {
    parser: Parser,
}

impl std::fmt::Debug for JavaParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JavaParser")
            .field("language", &"Java")
            .finish()
    }
}

impl JavaParser {
    pub fn new() -> ParseResult<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .map_err(|e| ParseError::LanguageSetup(e.to_string()))?;

        Ok(Self { parser })
    }

    /// Parses `code` into a compilation unit.
    ///
    /// Syntax errors do not fail the parse: tree-sitter recovers and whatever it
    /// could make sense of is lowered.
    pub fn parse(&mut self, code: &str) -> ParseResult<CompilationUnit> {
        let tree = self
            .parser
            .parse(code, None)
            .ok_or(ParseError::ParseFailed)?;
        let root = tree.root_node();
        if root.has_error() {
            tracing::debug!(
                target: "parser",
                "source contains syntax errors, lowering recovered tree"
            );
        }

        let package = self
            .extract_package_name(root, code)
            .unwrap_or_default()
            .to_string();
        let mut children = Vec::new();
        self.lower_children(root, code, &mut children, false, 0);

        Ok(CompilationUnit { package, children })
    }

    // =========================================================================
    // HELPER METHODS - Basic Utilities
    // =========================================================================

    /// Extract raw source text for a node
    fn text_for_node<'a>(&self, code: &'a str, node: Node) -> &'a str {
        &code[node.byte_range()]
    }

    fn ident(&self, code: &str, node: Node) -> Ident {
        Ident::new(
            self.text_for_node(code, node).trim(),
            Span::from_range(node.byte_range()),
        )
    }

    fn is_comment(node: Node) -> bool {
        matches!(node.kind(), NODE_LINE_COMMENT | NODE_BLOCK_COMMENT)
    }

    /// Number of arguments in an `argument_list`, comments excluded.
    fn count_arguments(node: Node) -> usize {
        let mut cursor = node.walk();
        node.named_children(&mut cursor)
            .filter(|child| !Self::is_comment(*child))
            .count()
    }

    // =========================================================================
    // HELPER METHODS - Documentation Extraction
    // =========================================================================

    /// Comments directly preceding `node`, delimiters stripped, oldest first.
    fn doc_comment_for(&self, node: &Node, code: &str) -> Option<String> {
        let mut comments = Vec::new();
        let mut current = node.prev_sibling();
        while let Some(sibling) = current {
            if !Self::is_comment(sibling) {
                break;
            }
            match self.extract_comment_text(self.text_for_node(code, sibling)) {
                Some(cleaned) => comments.push(cleaned),
                None => break,
            }
            current = sibling.prev_sibling();
        }

        if comments.is_empty() {
            return None;
        }
        comments.reverse();
        Some(comments.join("\n"))
    }

    /// Extract text from comment, removing delimiters
    fn extract_comment_text<'a>(&self, raw: &'a str) -> Option<&'a str> {
        let trimmed = raw.trim();

        // JavaDoc comment: /** ... */
        if let Some(content) = trimmed
            .strip_prefix("/**")
            .and_then(|s| s.strip_suffix("*/"))
        {
            return Some(content.trim());
        }

        // Block comment: /* ... */
        if let Some(content) = trimmed
            .strip_prefix("/*")
            .and_then(|s| s.strip_suffix("*/"))
        {
            return Some(content.trim());
        }

        // Line comment: //
        trimmed.strip_prefix("//").map(str::trim)
    }

    // =========================================================================
    // HEADER - Package and imports
    // =========================================================================

    /// Package in dot notation, `None` for the default package.
    fn extract_package_name<'a>(&self, root: Node, code: &'a str) -> Option<&'a str> {
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            if child.kind() == NODE_PACKAGE_DECLARATION {
                let mut pkg_cursor = child.walk();
                for pkg_child in child.children(&mut pkg_cursor) {
                    if matches!(pkg_child.kind(), NODE_SCOPED_IDENTIFIER | NODE_IDENTIFIER) {
                        return Some(self.text_for_node(code, pkg_child).trim());
                    }
                }
            }
        }
        None
    }

    fn lower_import(&self, node: Node, code: &str) -> Option<ImportDeclaration> {
        let mut name = None;
        let mut wildcard = false;
        let mut is_static = false;

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                NODE_SCOPED_IDENTIFIER | NODE_IDENTIFIER => {
                    name = Some(self.text_for_node(code, child).trim().to_string());
                }
                "asterisk" => wildcard = true,
                "static" => is_static = true,
                _ => {}
            }
        }

        Some(ImportDeclaration {
            name: name?,
            wildcard,
            is_static,
            span: Span::from_range(node.byte_range()),
        })
    }

    // =========================================================================
    // LOWERING - Main Recursive Walker
    // =========================================================================

    fn lower_children(
        &self,
        node: Node,
        code: &str,
        out: &mut Vec<SyntaxNode>,
        anonymous: bool,
        depth: usize,
    ) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.lower_node(child, code, out, anonymous, depth + 1);
        }
    }

    fn lower_scope(
        &self,
        node: Node,
        code: &str,
        out: &mut Vec<SyntaxNode>,
        anonymous: bool,
        depth: usize,
    ) {
        let mut scoped = Vec::new();
        self.lower_children(node, code, &mut scoped, anonymous, depth);
        out.push(SyntaxNode::Block(scoped));
    }

    /// Lowers `node` into `out`.
    ///
    /// `anonymous` is set while inside an anonymous class body, where member
    /// declarations belong to no declared type and are lowered as plain blocks.
    fn lower_node(
        &self,
        node: Node,
        code: &str,
        out: &mut Vec<SyntaxNode>,
        anonymous: bool,
        depth: usize,
    ) {
        if !check_recursion_depth(depth, node) {
            return;
        }

        match node.kind() {
            NODE_LINE_COMMENT | NODE_BLOCK_COMMENT | NODE_PACKAGE_DECLARATION => {}
            NODE_IMPORT_DECLARATION => {
                if let Some(import) = self.lower_import(node, code) {
                    out.push(SyntaxNode::Import(import));
                }
            }
            NODE_CLASS_DECLARATION
            | NODE_INTERFACE_DECLARATION
            | NODE_ENUM_DECLARATION
            | NODE_ANNOTATION_TYPE_DECLARATION
            | NODE_RECORD_DECLARATION => {
                if let Some(decl) = self.lower_type_declaration(node, code, depth) {
                    out.push(SyntaxNode::TypeDeclaration(decl));
                }
            }
            NODE_ENUM_CONSTANT => self.lower_children(node, code, out, true, depth),
            NODE_METHOD_DECLARATION | NODE_CONSTRUCTOR_DECLARATION if !anonymous => {
                if let Some(decl) = self.lower_method(node, code, depth) {
                    out.push(SyntaxNode::MethodDeclaration(decl));
                }
            }
            NODE_METHOD_DECLARATION
            | NODE_CONSTRUCTOR_DECLARATION
            | NODE_COMPACT_CONSTRUCTOR_DECLARATION => {
                let mut scoped = Vec::new();
                if let Some(body) = node.child_by_field_name("body") {
                    self.lower_node(body, code, &mut scoped, anonymous, depth + 1);
                }
                out.push(SyntaxNode::Block(scoped));
            }
            NODE_FIELD_DECLARATION | NODE_CONSTANT_DECLARATION => {
                if let Some(decl) = self.lower_field(node, code, anonymous, depth) {
                    out.push(SyntaxNode::FieldDeclaration(decl));
                }
            }
            NODE_LOCAL_VARIABLE_DECLARATION => {
                if let Some(decl) = self.lower_local_variable(node, code, anonymous, depth) {
                    out.push(SyntaxNode::LocalVariable(decl));
                }
            }
            NODE_ENHANCED_FOR_STATEMENT => {
                self.lower_enhanced_for(node, code, out, anonymous, depth)
            }
            NODE_RESOURCE => self.lower_resource(node, code, out, anonymous, depth),
            NODE_CATCH_FORMAL_PARAMETER => {
                if let Some(decl) = self.lower_catch_parameter(node, code) {
                    out.push(SyntaxNode::LocalVariable(decl));
                }
            }
            NODE_BLOCK
            | NODE_CONSTRUCTOR_BODY
            | NODE_FOR_STATEMENT
            | NODE_TRY_WITH_RESOURCES_STATEMENT
            | NODE_CATCH_CLAUSE
            | NODE_LAMBDA_EXPRESSION
            | NODE_SWITCH_BLOCK => self.lower_scope(node, code, out, anonymous, depth),
            NODE_METHOD_INVOCATION => self.lower_method_call(node, code, out, anonymous, depth),
            NODE_OBJECT_CREATION_EXPRESSION => {
                self.lower_object_creation(node, code, out, anonymous, depth)
            }
            _ => self.lower_children(node, code, out, anonymous, depth),
        }
    }

    // =========================================================================
    // LOWERING - Declarations
    // =========================================================================

    fn lower_type_declaration(
        &self,
        node: Node,
        code: &str,
        depth: usize,
    ) -> Option<TypeDeclaration> {
        let kind = match node.kind() {
            NODE_INTERFACE_DECLARATION => ClassKind::Interface,
            NODE_ENUM_DECLARATION => ClassKind::Enum,
            NODE_ANNOTATION_TYPE_DECLARATION => ClassKind::Annotation,
            _ => ClassKind::Class,
        };
        let name = self.ident(code, node.child_by_field_name("name")?);

        let mut members = Vec::new();
        if node.kind() == NODE_RECORD_DECLARATION {
            self.lower_record_components(node, code, &name, &mut members);
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.lower_children(body, code, &mut members, false, depth + 1);
        }

        Some(TypeDeclaration {
            kind,
            doc_comment: self.doc_comment_for(&node, code),
            name,
            members,
        })
    }

    /// Record components become fields. Without an explicit constructor the record
    /// also gets its canonical constructor, located at the record's name.
    fn lower_record_components(
        &self,
        node: Node,
        code: &str,
        name: &Ident,
        members: &mut Vec<SyntaxNode>,
    ) {
        let Some(parameters) = node.child_by_field_name("parameters") else {
            return;
        };
        let mut components = Vec::new();
        let mut cursor = parameters.walk();
        for child in parameters.named_children(&mut cursor) {
            if child.kind() != NODE_FORMAL_PARAMETER {
                continue;
            }
            let (Some(ty), Some(component)) = (
                child.child_by_field_name("type"),
                child.child_by_field_name("name"),
            ) else {
                continue;
            };
            let ident = self.ident(code, component);
            let type_name = self.text_for_node(code, ty).trim().to_string();
            members.push(SyntaxNode::FieldDeclaration(FieldDeclaration {
                type_name: type_name.clone(),
                names: vec![ident.clone()],
                initializers: Vec::new(),
            }));
            components.push(FormalParameter {
                name: ident.text,
                type_name,
            });
        }

        let has_constructor = node.child_by_field_name("body").is_some_and(|body| {
            let mut cursor = body.walk();
            body.named_children(&mut cursor)
                .any(|member| member.kind() == NODE_CONSTRUCTOR_DECLARATION)
        });
        if !has_constructor {
            members.push(SyntaxNode::MethodDeclaration(MethodDeclaration {
                name: name.clone(),
                is_constructor: true,
                parameters: components,
                body: Vec::new(),
            }));
        }
    }

    fn lower_method(&self, node: Node, code: &str, depth: usize) -> Option<MethodDeclaration> {
        let name = self.ident(code, node.child_by_field_name("name")?);
        let parameters = node
            .child_by_field_name("parameters")
            .map(|params| self.lower_parameters(params, code))
            .unwrap_or_default();

        let mut body = Vec::new();
        if let Some(block) = node.child_by_field_name("body") {
            self.lower_node(block, code, &mut body, false, depth + 1);
        }

        Some(MethodDeclaration {
            name,
            is_constructor: node.kind() == NODE_CONSTRUCTOR_DECLARATION,
            parameters,
            body,
        })
    }

    fn lower_parameters(&self, node: Node, code: &str) -> Vec<FormalParameter> {
        let mut parameters = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                NODE_FORMAL_PARAMETER => {
                    let (Some(ty), Some(name)) = (
                        child.child_by_field_name("type"),
                        child.child_by_field_name("name"),
                    ) else {
                        continue;
                    };
                    parameters.push(FormalParameter {
                        name: self.text_for_node(code, name).trim().to_string(),
                        type_name: self.text_for_node(code, ty).trim().to_string(),
                    });
                }
                NODE_SPREAD_PARAMETER => {
                    if let Some(parameter) = self.lower_spread_parameter(child, code) {
                        parameters.push(parameter);
                    }
                }
                // receiver parameters and comments
                _ => {}
            }
        }
        parameters
    }

    /// `String... args` is a `String[]` parameter named `args`.
    fn lower_spread_parameter(&self, node: Node, code: &str) -> Option<FormalParameter> {
        let mut type_name = None;
        let mut name = None;
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                NODE_MODIFIERS => {}
                NODE_VARIABLE_DECLARATOR => {
                    name = child
                        .child_by_field_name("name")
                        .map(|n| self.text_for_node(code, n).trim().to_string());
                }
                _ if type_name.is_none() && !Self::is_comment(child) => {
                    type_name = Some(format!("{}[]", self.text_for_node(code, child).trim()));
                }
                _ => {}
            }
        }
        Some(FormalParameter {
            name: name?,
            type_name: type_name?,
        })
    }

    /// Names and lowered initializers of every `declarator` of `node`.
    fn lower_declarators(
        &self,
        node: Node,
        code: &str,
        anonymous: bool,
        depth: usize,
    ) -> (Vec<Ident>, Vec<SyntaxNode>) {
        let mut names = Vec::new();
        let mut initializers = Vec::new();
        let mut cursor = node.walk();
        for declarator in node.children_by_field_name("declarator", &mut cursor) {
            if let Some(name) = declarator.child_by_field_name("name") {
                names.push(self.ident(code, name));
            }
            if let Some(value) = declarator.child_by_field_name("value") {
                self.lower_node(value, code, &mut initializers, anonymous, depth + 1);
            }
        }
        (names, initializers)
    }

    fn lower_field(
        &self,
        node: Node,
        code: &str,
        anonymous: bool,
        depth: usize,
    ) -> Option<FieldDeclaration> {
        let ty = node.child_by_field_name("type")?;
        let (names, initializers) = self.lower_declarators(node, code, anonymous, depth);
        Some(FieldDeclaration {
            type_name: self.text_for_node(code, ty).trim().to_string(),
            names,
            initializers,
        })
    }

    fn lower_local_variable(
        &self,
        node: Node,
        code: &str,
        anonymous: bool,
        depth: usize,
    ) -> Option<LocalVariableDeclaration> {
        let ty = node.child_by_field_name("type")?;
        let (names, initializers) = self.lower_declarators(node, code, anonymous, depth);
        Some(LocalVariableDeclaration {
            type_name: self.text_for_node(code, ty).trim().to_string(),
            type_span: Span::from_range(ty.byte_range()),
            names,
            initializers,
        })
    }

    /// `for (T x : xs) body` binds `x` in a scope spanning the loop.
    fn lower_enhanced_for(
        &self,
        node: Node,
        code: &str,
        out: &mut Vec<SyntaxNode>,
        anonymous: bool,
        depth: usize,
    ) {
        let mut scoped = Vec::new();
        if let Some(value) = node.child_by_field_name("value") {
            self.lower_node(value, code, &mut scoped, anonymous, depth + 1);
        }
        if let (Some(ty), Some(name)) = (
            node.child_by_field_name("type"),
            node.child_by_field_name("name"),
        ) {
            scoped.push(SyntaxNode::LocalVariable(LocalVariableDeclaration {
                type_name: self.text_for_node(code, ty).trim().to_string(),
                type_span: Span::from_range(ty.byte_range()),
                names: vec![self.ident(code, name)],
                initializers: Vec::new(),
            }));
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.lower_node(body, code, &mut scoped, anonymous, depth + 1);
        }
        out.push(SyntaxNode::Block(scoped));
    }

    /// A try-with-resources resource either declares a variable or names one.
    fn lower_resource(
        &self,
        node: Node,
        code: &str,
        out: &mut Vec<SyntaxNode>,
        anonymous: bool,
        depth: usize,
    ) {
        let (Some(ty), Some(name)) = (
            node.child_by_field_name("type"),
            node.child_by_field_name("name"),
        ) else {
            self.lower_children(node, code, out, anonymous, depth);
            return;
        };

        let mut initializers = Vec::new();
        if let Some(value) = node.child_by_field_name("value") {
            self.lower_node(value, code, &mut initializers, anonymous, depth + 1);
        }
        out.push(SyntaxNode::LocalVariable(LocalVariableDeclaration {
            type_name: self.text_for_node(code, ty).trim().to_string(),
            type_span: Span::from_range(ty.byte_range()),
            names: vec![self.ident(code, name)],
            initializers,
        }));
    }

    /// Only single-type catch parameters are bound; `catch (A | B e)` is skipped.
    fn lower_catch_parameter(&self, node: Node, code: &str) -> Option<LocalVariableDeclaration> {
        let name = node.child_by_field_name("name")?;
        let mut cursor = node.walk();
        let catch_type = node
            .named_children(&mut cursor)
            .find(|child| child.kind() == NODE_CATCH_TYPE)?;

        let mut type_cursor = catch_type.walk();
        let mut types = catch_type
            .named_children(&mut type_cursor)
            .filter(|child| !Self::is_comment(*child));
        let (Some(ty), None) = (types.next(), types.next()) else {
            return None;
        };

        Some(LocalVariableDeclaration {
            type_name: self.text_for_node(code, ty).trim().to_string(),
            type_span: Span::from_range(ty.byte_range()),
            names: vec![self.ident(code, name)],
            initializers: Vec::new(),
        })
    }

    // =========================================================================
    // LOWERING - Expressions
    // =========================================================================

    fn lower_method_call(
        &self,
        node: Node,
        code: &str,
        out: &mut Vec<SyntaxNode>,
        anonymous: bool,
        depth: usize,
    ) {
        let Some(name) = node.child_by_field_name("name") else {
            self.lower_children(node, code, out, anonymous, depth);
            return;
        };
        let object = node.child_by_field_name("object");
        let arguments = node.child_by_field_name("arguments");

        let receiver = match object {
            None => Receiver::None,
            Some(object) => match object.kind() {
                NODE_THIS => Receiver::SelfRef,
                NODE_IDENTIFIER => {
                    Receiver::Name(self.text_for_node(code, object).trim().to_string())
                }
                _ => Receiver::Expression,
            },
        };

        let mut children = Vec::new();
        if let Some(object) = object {
            self.lower_node(object, code, &mut children, anonymous, depth + 1);
        }
        if let Some(arguments) = arguments {
            self.lower_children(arguments, code, &mut children, anonymous, depth);
        }

        out.push(SyntaxNode::MethodCall(MethodCall {
            name: self.ident(code, name),
            receiver,
            argument_count: arguments.map(Self::count_arguments).unwrap_or(0),
            children,
        }));
    }

    fn lower_object_creation(
        &self,
        node: Node,
        code: &str,
        out: &mut Vec<SyntaxNode>,
        anonymous: bool,
        depth: usize,
    ) {
        let Some(ty) = node.child_by_field_name("type") else {
            self.lower_children(node, code, out, anonymous, depth);
            return;
        };
        let arguments = node.child_by_field_name("arguments");

        let mut lowered = Vec::new();
        if let Some(arguments) = arguments {
            self.lower_children(arguments, code, &mut lowered, anonymous, depth);
        }
        let mut cursor = node.walk();
        let body = node
            .named_children(&mut cursor)
            .find(|child| child.kind() == NODE_CLASS_BODY);
        if let Some(body) = body {
            let mut members = Vec::new();
            self.lower_children(body, code, &mut members, true, depth);
            lowered.push(SyntaxNode::AnonymousClassBody(members));
        }

        out.push(SyntaxNode::ObjectCreation(ObjectCreation {
            type_name: self.text_for_node(code, ty).trim().to_string(),
            type_span: Span::from_range(ty.byte_range()),
            argument_count: arguments.map(Self::count_arguments).unwrap_or(0),
            arguments: lowered,
        }));
    }
}
