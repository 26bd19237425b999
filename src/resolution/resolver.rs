//! Cross-reference resolution for one file.
//!
//! The resolver walks a file's syntax tree once, moving the symbol table's scopes in
//! lock-step with the tree, and records every reference it can tie to a declaration
//! discovered by the declaration pass.

use super::error::{ResolveError, ResolveResult};
use super::symbol_table::SymbolTable;
use crate::symbol::{
    CONSTRUCTOR_NAME, MethodUsageKind, TypeHandle, TypeUsageKind, Usage, drop_generic_types,
    member_name,
};
use crate::syntax::{
    CompilationUnit, ImportDeclaration, LocalVariableDeclaration, MethodCall,
    MethodDeclaration, ObjectCreation, Receiver, SyntaxNode, TypeDeclaration,
};
use crate::types::{FileId, LineIndex, Location, Span};

/// Resolves the references of one file against a symbol table.
///
/// The table is borrowed for exactly one file. On error the table is left wherever
/// resolution stopped; [`extract_usages`] unwinds it.
pub struct CrossReferenceResolver<'a> {
    file: FileId,
    lines: LineIndex<'a>,
    table: &'a mut SymbolTable,
    usages: Vec<Usage>,
    /// Class depth at each open anonymous class body, innermost last.
    anonymous_bodies: Vec<usize>,
}

impl<'a> CrossReferenceResolver<'a> {
    pub fn new(file: FileId, source: &'a str, table: &'a mut SymbolTable) -> Self {
        Self {
            file,
            lines: LineIndex::new(source),
            table,
            usages: Vec::new(),
            anonymous_bodies: Vec::new(),
        }
    }

    /// Usages of `unit` in traversal order.
    pub fn resolve(mut self, unit: &CompilationUnit) -> ResolveResult<Vec<Usage>> {
        self.table.enter_compilation_unit(&unit.package)?;
        self.visit_all(&unit.children)?;
        self.table.leave_compilation_unit()?;
        Ok(self.usages)
    }

    fn visit_all(&mut self, nodes: &[SyntaxNode]) -> ResolveResult<()> {
        for node in nodes {
            self.visit(node)?;
        }
        Ok(())
    }

    fn visit(&mut self, node: &SyntaxNode) -> ResolveResult<()> {
        match node {
            SyntaxNode::Import(import) => self.visit_import(import),
            SyntaxNode::TypeDeclaration(decl) => self.visit_type_declaration(decl),
            SyntaxNode::MethodDeclaration(decl) => self.visit_method_declaration(decl),
            SyntaxNode::FieldDeclaration(decl) => self.visit_all(&decl.initializers),
            SyntaxNode::Block(children) => {
                self.table.enter_scope();
                self.visit_all(children)?;
                self.table.leave_scope()?;
                Ok(())
            }
            SyntaxNode::AnonymousClassBody(members) => {
                self.anonymous_bodies.push(self.table.class_depth());
                self.table.enter_scope();
                self.visit_all(members)?;
                self.table.leave_scope()?;
                self.anonymous_bodies.pop();
                Ok(())
            }
            SyntaxNode::LocalVariable(decl) => self.visit_local_variable(decl),
            SyntaxNode::MethodCall(call) => self.visit_method_call(call),
            SyntaxNode::ObjectCreation(creation) => self.visit_object_creation(creation),
        }
    }

    fn visit_import(&mut self, import: &ImportDeclaration) -> ResolveResult<()> {
        if import.is_static {
            tracing::trace!(target: "resolver", "skipping static import {}", import.name);
            return Ok(());
        }
        if import.wildcard {
            self.table.register_import_package(&import.name)?;
        } else {
            let handle = self.table.resolve_class_handle(&import.name);
            self.table.register_import_class(&handle)?;
        }
        Ok(())
    }

    fn visit_type_declaration(&mut self, decl: &TypeDeclaration) -> ResolveResult<()> {
        let class = self
            .table
            .get_class_type_by_location(self.file, decl.name.span)
            .cloned()
            .ok_or_else(|| ResolveError::MissingTypeDeclaration {
                name: decl.name.text.clone(),
                location: self.location(decl.name.span),
            })?;

        self.table.enter_class_scope(class);
        self.visit_all(&decl.members)?;
        self.table.leave_class_scope()?;
        Ok(())
    }

    fn visit_method_declaration(&mut self, decl: &MethodDeclaration) -> ResolveResult<()> {
        let class = self
            .table
            .current_class()
            .ok_or_else(|| ResolveError::NoEnclosingClass {
                name: decl.name.text.clone(),
                location: self.location(decl.name.span),
            })?;
        let method = class
            .methods
            .iter()
            .find(|method| method.location.span == decl.name.span)
            .cloned()
            .ok_or_else(|| ResolveError::MissingMethodDeclaration {
                name: decl.name.text.clone(),
                class: class.name().to_string(),
                location: self.location(decl.name.span),
            })?;

        self.table.enter_method_scope(&method);
        self.visit_all(&decl.body)?;
        self.table.leave_method_scope()?;
        Ok(())
    }

    fn visit_local_variable(&mut self, decl: &LocalVariableDeclaration) -> ResolveResult<()> {
        let ty = self
            .table
            .resolve_type_handle(&drop_generic_types(&decl.type_name));
        self.usages.push(Usage::type_usage(
            ty.clone(),
            TypeUsageKind::LocalVariable,
            self.location(decl.type_span),
            self.lines.line_text(decl.type_span.from),
        ));

        for name in &decl.names {
            if ty.is_unresolved_class() {
                tracing::debug!(
                    target: "resolver",
                    "not binding '{}': type {ty} is unresolved",
                    name.text
                );
                continue;
            }
            self.table.register_variable(name.text.clone(), ty.clone());
        }

        self.visit_all(&decl.initializers)
    }

    fn visit_method_call(&mut self, call: &MethodCall) -> ResolveResult<()> {
        let receiver = match &call.receiver {
            Receiver::None | Receiver::SelfRef if self.in_anonymous_body() => {
                tracing::debug!(
                    target: "resolver",
                    "call to '{}' at {} targets an anonymous class",
                    call.name.text,
                    call.name.span
                );
                None
            }
            Receiver::None | Receiver::SelfRef => self
                .table
                .current_class()
                .map(|class| TypeHandle::Class(class.handle.clone())),
            Receiver::Name(name) => Some(match self.table.get_variable_type(name) {
                Some(ty) => ty.clone(),
                None => self.table.resolve_type_handle(name),
            }),
            Receiver::Expression => {
                tracing::debug!(
                    target: "resolver",
                    "unsupported receiver for call to '{}' at {}",
                    call.name.text,
                    call.name.span
                );
                None
            }
        };

        if let Some(receiver) = receiver {
            self.resolve_call_site(
                &receiver,
                &call.name.text,
                call.argument_count,
                MethodUsageKind::MethodCall,
                call.name.span,
            );
        }

        self.visit_all(&call.children)
    }

    fn visit_object_creation(&mut self, creation: &ObjectCreation) -> ResolveResult<()> {
        let ty = self
            .table
            .resolve_type_handle(&drop_generic_types(&creation.type_name));
        self.resolve_call_site(
            &ty,
            CONSTRUCTOR_NAME,
            creation.argument_count,
            MethodUsageKind::InstanceCreation,
            creation.type_span,
        );
        self.visit_all(&creation.arguments)
    }

    /// Emits a usage when exactly one method of `receiver` named `member` takes
    /// `argument_count` parameters.
    fn resolve_call_site(
        &mut self,
        receiver: &TypeHandle,
        member: &str,
        argument_count: usize,
        kind: MethodUsageKind,
        span: Span,
    ) {
        let Some(handle) = receiver.as_class().filter(|handle| handle.resolved) else {
            tracing::trace!(
                target: "resolver",
                "{member}: receiver {receiver} is not a resolved class"
            );
            return;
        };
        let Some(class) = self.table.get_class_by_handle(handle) else {
            tracing::debug!(target: "resolver", "{member}: class {handle} is not registered");
            return;
        };

        let qualified = member_name(&handle.name, member);
        let mut candidates = class.methods.iter().filter(|method| {
            method.handle.name == qualified && method.parameter_count() == argument_count
        });
        let (Some(method), None) = (candidates.next(), candidates.next()) else {
            tracing::debug!(
                target: "resolver",
                "no unique {kind} target {qualified}/{argument_count} at {span}"
            );
            return;
        };

        let (method, definition) = (method.handle.clone(), method.location);
        self.usages.push(Usage::method_usage(
            method,
            kind,
            definition,
            self.location(span),
            self.lines.line_text(span.from),
        ));
    }

    /// True while the innermost enclosing class is an anonymous one.
    fn in_anonymous_body(&self) -> bool {
        self.anonymous_bodies.last() == Some(&self.table.class_depth())
    }

    fn location(&self, span: Span) -> Location {
        Location::new(self.file, span)
    }
}

/// Resolves `unit` with `table` and returns its usages in traversal order.
///
/// On failure the table is unwound to its root frame, so a caller reusing one table
/// across files can move on to the next file.
pub fn extract_usages(
    file: FileId,
    source: &str,
    unit: &CompilationUnit,
    table: &mut SymbolTable,
) -> ResolveResult<Vec<Usage>> {
    let result = CrossReferenceResolver::new(file, source, table).resolve(unit);
    if result.is_err() {
        table.unwind();
    }
    result
}
