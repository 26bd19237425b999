//! Declaration pass.
//!
//! Runs before any file is resolved. [`collect_declarations`] turns the type
//! declarations of one file into [`ClassType`]s with raw member types. Once every
//! class of the project is registered, [`link_declarations`] resolves those member
//! types under the declaring file's package and imports.

use crate::resolution::{SymbolTable, SymbolTableError};
use crate::symbol::{
    CONSTRUCTOR_NAME, ClassKind, ClassType, Parameter, TypeHandle, member_name,
};
use crate::syntax::{CompilationUnit, MethodDeclaration, SyntaxNode, TypeDeclaration};
use crate::types::{FileId, Location};
use std::collections::HashMap;

/// Every type declared in `unit`, outer types before the types nested in them.
///
/// Member types are qualified under their enclosing type (`p.Outer.Inner`). Local
/// types, declared inside a method body, initializer or anonymous class body, get
/// the binary name javac gives them (`p.Outer$1Local`), numbered per enclosing type
/// and simple name so that same-named local types never share a handle. Field and
/// parameter types are kept as written: primitives, or unresolved class handles.
pub fn collect_declarations(file: FileId, unit: &CompilationUnit) -> Vec<ClassType> {
    let mut collector = DeclarationCollector {
        file,
        classes: Vec::new(),
        local_ordinals: HashMap::new(),
    };
    collector.collect_members(&unit.package, &unit.children);
    collector.classes
}

struct DeclarationCollector {
    file: FileId,
    classes: Vec<ClassType>,
    /// Local types seen so far per `(enclosing type, simple name)`.
    local_ordinals: HashMap<(String, String), usize>,
}

impl DeclarationCollector {
    /// `nodes` are the members of `owner`, or the top level of a compilation unit.
    fn collect_members(&mut self, owner: &str, nodes: &[SyntaxNode]) {
        for node in nodes {
            match node {
                SyntaxNode::TypeDeclaration(decl) => {
                    self.collect_type(member_name(owner, &decl.name.text), decl)
                }
                other => self.collect_local(owner, other.children()),
            }
        }
    }

    /// `nodes` sit inside a member body of `owner`.
    fn collect_local(&mut self, owner: &str, nodes: &[SyntaxNode]) {
        for node in nodes {
            match node {
                SyntaxNode::TypeDeclaration(decl) => {
                    let name = self.local_name(owner, &decl.name.text);
                    self.collect_type(name, decl)
                }
                other => self.collect_local(owner, other.children()),
            }
        }
    }

    fn local_name(&mut self, owner: &str, simple: &str) -> String {
        let ordinal = self
            .local_ordinals
            .entry((owner.to_string(), simple.to_string()))
            .or_insert(0);
        *ordinal += 1;
        format!("{owner}${ordinal}{simple}")
    }

    fn collect_type(&mut self, name: String, decl: &TypeDeclaration) {
        let file = self.file;
        let location = Location::new(file, decl.name.span);
        let mut class = ClassType::new(name.clone(), decl.kind, location);
        class.doc_comment = decl.doc_comment.clone();

        for member in &decl.members {
            match member {
                SyntaxNode::MethodDeclaration(method) => add_method(file, &mut class, method),
                SyntaxNode::FieldDeclaration(field) => {
                    let ty = TypeHandle::from_source(&field.type_name);
                    for field_name in &field.names {
                        class.add_field(&field_name.text, ty.clone());
                    }
                }
                _ => {}
            }
        }

        // Implicit default constructor
        if matches!(decl.kind, ClassKind::Class | ClassKind::Enum) && !class.has_constructor() {
            let location = class.location;
            class.add_method(CONSTRUCTOR_NAME, Vec::new(), location);
        }

        tracing::trace!(
            target: "indexer",
            "declared {name}: {} method(s), {} field(s)",
            class.methods.len(),
            class.fields.len()
        );
        self.classes.push(class);
        self.collect_members(&name, &decl.members);
    }
}

fn add_method(file: FileId, class: &mut ClassType, method: &MethodDeclaration) {
    let member = if method.is_constructor {
        CONSTRUCTOR_NAME
    } else {
        method.name.text.as_str()
    };
    let parameters = method
        .parameters
        .iter()
        .map(|parameter| Parameter {
            name: parameter.name.clone(),
            ty: TypeHandle::from_source(&parameter.type_name),
        })
        .collect();
    class.add_method(member, parameters, Location::new(file, method.name.span));
}

/// Resolves the unresolved field and parameter types of `classes`, all declared in
/// `unit`, and registers the classes that changed at the table's current frame.
///
/// Every class of the project must already be registered. Returns the number of
/// classes that were re-registered.
pub fn link_declarations(
    table: &mut SymbolTable,
    unit: &CompilationUnit,
    classes: &[ClassType],
) -> Result<usize, SymbolTableError> {
    let linked = match link_in_unit(table, unit, classes) {
        Ok(linked) => linked,
        Err(e) => {
            table.unwind();
            return Err(e);
        }
    };

    let count = linked.len();
    for class in linked {
        table.register_class_type(class);
    }
    Ok(count)
}

fn link_in_unit(
    table: &mut SymbolTable,
    unit: &CompilationUnit,
    classes: &[ClassType],
) -> Result<Vec<ClassType>, SymbolTableError> {
    table.enter_compilation_unit(&unit.package)?;
    for import in unit.imports().filter(|import| !import.is_static) {
        if import.wildcard {
            table.register_import_package(&import.name)?;
        } else {
            let handle = table.resolve_class_handle(&import.name);
            table.register_import_class(&handle)?;
        }
    }

    let linked = classes
        .iter()
        .filter_map(|class| link_class(table, class))
        .collect();
    table.leave_compilation_unit()?;
    Ok(linked)
}

/// `class` with its unresolved member types resolved, or `None` when nothing changed.
fn link_class(table: &SymbolTable, class: &ClassType) -> Option<ClassType> {
    let mut linked = class.clone();
    let mut changed = false;
    let mut relink = |ty: &mut TypeHandle| {
        let TypeHandle::Class(handle) = ty else {
            return;
        };
        if handle.resolved {
            return;
        }
        let resolved = table.resolve_type_handle(&handle.name);
        if resolved != *ty {
            *ty = resolved;
            changed = true;
        }
    };

    for field in &mut linked.fields {
        relink(&mut field.ty);
    }
    for method in &mut linked.methods {
        for parameter in &mut method.parameters {
            relink(&mut parameter.ty);
        }
    }

    changed.then_some(linked)
}
