//! Symbol table: the global class registry plus the lexical environment of the file
//! currently being processed.
//!
//! Resolution order for a class name (first match wins):
//! 1. the name as a fully qualified name
//! 2. an import alias, then its qualified name
//! 3. `<active package>.<name>`
//! 4. the name alone again (default-package declarations)
//!
//! The environment is a stack of [`Frame`]s mirroring the lexical nesting of the
//! file: compilation unit, then types, members and blocks. The root frame is never
//! popped.

use super::error::SymbolTableError;
use super::frame::Frame;
use super::registry::ClassRegistry;
use crate::symbol::{ClassType, ClassTypeHandle, Method, PrimitiveType, TypeHandle};
use crate::types::{FileId, Location, Span};
use std::collections::HashMap;
use std::sync::Arc;

/// Package and import aliases of the active compilation unit.
#[derive(Debug, Clone)]
struct UnitScope {
    package: String,
    /// Simple name -> qualified name.
    imports: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct SymbolTable {
    registry: Arc<ClassRegistry>,
    /// Innermost frame last. Frames are copied on write, so forks share the root
    /// frame until one of them registers into it.
    frames: Vec<Arc<Frame>>,
    /// Innermost class last.
    class_stack: Vec<Arc<ClassType>>,
    unit: Option<UnitScope>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::with_registry(Arc::new(ClassRegistry::new()))
    }

    pub fn with_registry(registry: Arc<ClassRegistry>) -> Self {
        Self {
            registry,
            frames: vec![Arc::new(Frame::new())],
            class_stack: Vec::new(),
            unit: None,
        }
    }

    /// A table sharing this table's registry and root frame, with an environment of
    /// its own.
    ///
    /// Resolution only reads the registry, so every file of a project can be resolved
    /// on its own fork in parallel. Registering a class on a fork copies the registry
    /// first and never affects other tables.
    pub fn fork(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            frames: self.frames.first().cloned().into_iter().collect(),
            class_stack: Vec::new(),
            unit: None,
        }
    }

    pub fn registry(&self) -> &Arc<ClassRegistry> {
        &self.registry
    }

    // =========================================================================
    // Scope lifecycle
    // =========================================================================

    pub fn enter_compilation_unit(&mut self, package: &str) -> Result<(), SymbolTableError> {
        if let Some(active) = &self.unit {
            return Err(SymbolTableError::CompilationUnitActive {
                active: active.package.clone(),
                requested: package.to_string(),
            });
        }
        self.unit = Some(UnitScope {
            package: package.to_string(),
            imports: HashMap::new(),
        });
        self.enter_scope();
        Ok(())
    }

    pub fn leave_compilation_unit(&mut self) -> Result<(), SymbolTableError> {
        if self.unit.take().is_none() {
            return Err(SymbolTableError::NoCompilationUnit);
        }
        self.leave_scope()
    }

    /// Drops the active compilation unit and every scope above the root frame.
    ///
    /// Used after a file failed half-way through so the table can process the next
    /// file.
    pub fn unwind(&mut self) {
        self.unit = None;
        self.frames.truncate(1);
        self.class_stack.clear();
    }

    pub fn enter_scope(&mut self) {
        self.frames.push(Arc::new(Frame::new()));
    }

    pub fn leave_scope(&mut self) -> Result<(), SymbolTableError> {
        if self.frames.len() <= 1 {
            return Err(SymbolTableError::RootFrame);
        }
        self.frames.pop();
        Ok(())
    }

    /// Enters a scope binding every field of `class` by its unqualified name, and
    /// makes `class` the current class.
    pub fn enter_class_scope(&mut self, class: Arc<ClassType>) {
        self.enter_scope();
        for field in &class.fields {
            let name = class.unqualified_field_name(field).to_string();
            self.register_variable(name, field.ty.clone());
        }
        self.class_stack.push(class);
    }

    pub fn leave_class_scope(&mut self) -> Result<(), SymbolTableError> {
        if self.class_stack.is_empty() {
            return Err(SymbolTableError::NoClassScope);
        }
        self.leave_scope()?;
        self.class_stack.pop();
        Ok(())
    }

    /// Enters a scope binding every parameter of `method`.
    pub fn enter_method_scope(&mut self, method: &Method) {
        self.enter_scope();
        for parameter in &method.parameters {
            self.register_variable(parameter.name.clone(), parameter.ty.clone());
        }
    }

    pub fn leave_method_scope(&mut self) -> Result<(), SymbolTableError> {
        self.leave_scope()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn class_depth(&self) -> usize {
        self.class_stack.len()
    }

    pub fn current_class(&self) -> Option<&Arc<ClassType>> {
        self.class_stack.last()
    }

    pub fn package(&self) -> Option<&str> {
        self.unit.as_ref().map(|unit| unit.package.as_str())
    }

    fn current_frame_mut(&mut self) -> &mut Frame {
        if self.frames.is_empty() {
            self.frames.push(Arc::new(Frame::new()));
        }
        let last = self.frames.len() - 1;
        Arc::make_mut(&mut self.frames[last])
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Adds `class` to the global registry and to the current frame.
    pub fn register_class_type(&mut self, class: ClassType) -> Arc<ClassType> {
        let class = Arc::new(class);
        Arc::make_mut(&mut self.registry).insert(Arc::clone(&class));
        self.current_frame_mut().register_class_type(Arc::clone(&class));
        class
    }

    /// Imports every class of `package` visible in an active frame right now.
    ///
    /// Classes registered after this call are not imported retroactively; they stay
    /// reachable through the same-package and qualified-name rules only.
    pub fn register_import_package(&mut self, package: &str) -> Result<(), SymbolTableError> {
        let matching: Vec<ClassTypeHandle> = self
            .frames
            .iter()
            .flat_map(|frame| frame.classes())
            .filter(|class| class.handle.package() == package)
            .map(|class| class.handle.clone())
            .collect();
        tracing::debug!(
            target: "symbol_table",
            "wildcard import {package}.* brings {} class(es)",
            matching.len()
        );
        for handle in &matching {
            self.register_import_class(handle)?;
        }
        Ok(())
    }

    pub fn register_import_class(
        &mut self,
        handle: &ClassTypeHandle,
    ) -> Result<(), SymbolTableError> {
        let unit = self.unit.as_mut().ok_or(SymbolTableError::NoCompilationUnit)?;
        unit.imports.insert(handle.simple_name().to_string(), handle.name.clone());
        Ok(())
    }

    pub fn register_variable(&mut self, name: impl Into<String>, ty: TypeHandle) {
        self.current_frame_mut().register_variable(name, ty);
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    fn resolve_import_alias(&self, alias: &str) -> Option<&str> {
        let resolved = self
            .unit
            .as_ref()
            .and_then(|unit| unit.imports.get(alias))
            .map(String::as_str);
        match resolved {
            Some(name) => {
                tracing::debug!(target: "symbol_table", "import alias {alias} -> {name}")
            }
            None => tracing::trace!(target: "symbol_table", "no import alias for {alias}"),
        }
        resolved
    }

    pub fn resolve_class(&self, name: &str) -> Option<&Arc<ClassType>> {
        let (class, reason) = if let Some(class) = self.registry.get_by_name(name) {
            (Some(class), "fully qualified")
        } else if let Some(class) = self
            .resolve_import_alias(name)
            .and_then(|imported| self.registry.get_by_name(imported))
        {
            (Some(class), "imported")
        } else if let Some(class) = self
            .package()
            .filter(|package| !package.is_empty())
            .and_then(|package| self.registry.get_by_name(&format!("{package}.{name}")))
        {
            (Some(class), "same package")
        } else {
            (self.registry.get_by_name(name), "default package")
        };

        match class {
            Some(class) => tracing::debug!(
                target: "symbol_table",
                "resolved {name} to {} ({reason})",
                class.handle
            ),
            None => tracing::debug!(target: "symbol_table", "failed to resolve {name}"),
        }
        class
    }

    pub fn resolve_primitive(&self, name: &str) -> Option<PrimitiveType> {
        PrimitiveType::parse(name)
    }

    /// Handle of the class `name` refers to. Unknown names yield an unresolved handle
    /// carrying the import-alias expansion of `name` when there is one.
    pub fn resolve_class_handle(&self, name: &str) -> ClassTypeHandle {
        if let Some(class) = self.resolve_class(name) {
            return class.handle.clone();
        }
        match self.resolve_import_alias(name) {
            Some(full_name) => ClassTypeHandle::unresolved(full_name),
            None => ClassTypeHandle::unresolved(name),
        }
    }

    /// Primitive or class handle for `name`. Never fails.
    pub fn resolve_type_handle(&self, name: &str) -> TypeHandle {
        match self.resolve_primitive(name) {
            Some(primitive) => TypeHandle::Primitive(primitive),
            None => TypeHandle::Class(self.resolve_class_handle(name)),
        }
    }

    /// Type bound to `name` in the innermost frame that binds it.
    pub fn get_variable_type(&self, name: &str) -> Option<&TypeHandle> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.variable_type(name))
    }

    pub fn get_class_type_by_location(&self, file: FileId, span: Span) -> Option<&Arc<ClassType>> {
        self.registry.get_by_location(&Location::new(file, span))
    }

    pub fn get_class_by_handle(&self, handle: &ClassTypeHandle) -> Option<&Arc<ClassType>> {
        self.registry.get_by_handle(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{ClassKind, Parameter};

    fn file() -> FileId {
        FileId::new(1).unwrap()
    }

    fn class(name: &str, from: u32) -> ClassType {
        ClassType::new(name, ClassKind::Class, Location::new(file(), Span::new(from, from + 1)))
    }

    fn class_handle(name: &str) -> TypeHandle {
        ClassTypeHandle::resolved(name).into()
    }

    #[test]
    fn test_starts_with_single_root_frame() {
        let table = SymbolTable::new();
        assert_eq!(table.depth(), 1);
        assert_eq!(table.class_depth(), 0);
        assert!(table.package().is_none());
    }

    #[test]
    fn test_enter_compilation_unit_twice_fails() {
        let mut table = SymbolTable::new();
        table.enter_compilation_unit("p").unwrap();

        let err = table.enter_compilation_unit("q").unwrap_err();
        assert_eq!(
            err,
            SymbolTableError::CompilationUnitActive {
                active: "p".to_string(),
                requested: "q".to_string(),
            }
        );

        table.leave_compilation_unit().unwrap();
        assert!(table.enter_compilation_unit("q").is_ok());
    }

    #[test]
    fn test_root_frame_cannot_be_left() {
        let mut table = SymbolTable::new();
        assert_eq!(table.leave_scope(), Err(SymbolTableError::RootFrame));
        assert_eq!(table.leave_class_scope(), Err(SymbolTableError::NoClassScope));
        assert_eq!(
            table.leave_compilation_unit(),
            Err(SymbolTableError::NoCompilationUnit)
        );
        assert_eq!(table.depth(), 1);
    }

    #[test]
    fn test_nested_scopes_restore_depths() {
        let mut table = SymbolTable::new();
        let outer = table.register_class_type(class("p.Outer", 0));
        let inner = table.register_class_type(class("p.Outer.Inner", 10));
        let method = Method {
            handle: crate::symbol::MethodHandle::new(&inner.handle, "run"),
            parameters: Vec::new(),
            location: Location::new(file(), Span::new(20, 23)),
        };

        table.enter_compilation_unit("p").unwrap();
        let (depth, class_depth) = (table.depth(), table.class_depth());

        table.enter_class_scope(Arc::clone(&outer));
        table.enter_class_scope(Arc::clone(&inner));
        table.enter_method_scope(&method);
        table.enter_scope();
        table.enter_scope();
        assert_eq!(table.depth(), depth + 5);
        assert_eq!(table.class_depth(), class_depth + 2);
        assert_eq!(table.current_class().unwrap().name(), "p.Outer.Inner");

        table.leave_scope().unwrap();
        table.leave_scope().unwrap();
        table.leave_method_scope().unwrap();
        table.leave_class_scope().unwrap();
        assert_eq!(table.current_class().unwrap().name(), "p.Outer");
        table.leave_class_scope().unwrap();

        assert_eq!(table.depth(), depth);
        assert_eq!(table.class_depth(), class_depth);
        table.leave_compilation_unit().unwrap();
        assert_eq!(table.depth(), 1);
    }

    #[test]
    fn test_variable_visibility_follows_scopes() {
        let mut table = SymbolTable::new();
        table.enter_compilation_unit("p").unwrap();
        table.enter_scope();
        table.register_variable("x", PrimitiveType::Int.into());

        table.enter_scope();
        assert_eq!(
            table.get_variable_type("x"),
            Some(&TypeHandle::Primitive(PrimitiveType::Int))
        );
        table.register_variable("x", class_handle("p.Shadow"));
        assert_eq!(table.get_variable_type("x"), Some(&class_handle("p.Shadow")));
        table.leave_scope().unwrap();

        assert_eq!(
            table.get_variable_type("x"),
            Some(&TypeHandle::Primitive(PrimitiveType::Int))
        );
        table.leave_scope().unwrap();
        assert!(table.get_variable_type("x").is_none());
        table.leave_compilation_unit().unwrap();
    }

    #[test]
    fn test_class_scope_binds_unqualified_fields() {
        let mut table = SymbolTable::new();
        let mut a = class("p.A", 0);
        a.add_field("count", PrimitiveType::Long.into());
        a.add_field("helper", class_handle("q.Helper"));
        let a = table.register_class_type(a);

        table.enter_compilation_unit("p").unwrap();
        table.enter_class_scope(a);
        assert_eq!(
            table.get_variable_type("count"),
            Some(&TypeHandle::Primitive(PrimitiveType::Long))
        );
        assert_eq!(table.get_variable_type("helper"), Some(&class_handle("q.Helper")));
        assert!(table.get_variable_type("p.A.count").is_none());
        table.leave_class_scope().unwrap();
        assert!(table.get_variable_type("count").is_none());
        table.leave_compilation_unit().unwrap();
    }

    #[test]
    fn test_method_scope_binds_parameters() {
        let mut table = SymbolTable::new();
        let owner = ClassTypeHandle::resolved("p.A");
        let method = Method {
            handle: crate::symbol::MethodHandle::new(&owner, "m"),
            parameters: vec![
                Parameter {
                    name: "a".to_string(),
                    ty: PrimitiveType::Int.into(),
                },
                Parameter {
                    name: "b".to_string(),
                    ty: class_handle("q.Foo"),
                },
            ],
            location: Location::new(file(), Span::new(0, 1)),
        };

        table.enter_method_scope(&method);
        assert_eq!(table.get_variable_type("b"), Some(&class_handle("q.Foo")));
        table.leave_method_scope().unwrap();
        assert!(table.get_variable_type("a").is_none());
    }

    #[test]
    fn test_resolution_priority_prefers_qualified_name() {
        let mut table = SymbolTable::new();
        table.register_class_type(class("Foo", 0));
        table.register_class_type(class("q.Foo", 5));
        table.register_class_type(class("p.Foo", 10));

        table.enter_compilation_unit("p").unwrap();
        table
            .register_import_class(&ClassTypeHandle::resolved("q.Foo"))
            .unwrap();

        assert_eq!(table.resolve_class("q.Foo").unwrap().name(), "q.Foo");
        assert_eq!(table.resolve_class("p.Foo").unwrap().name(), "p.Foo");
        // "Foo" is itself a registered default-package name, which outranks the alias.
        assert_eq!(table.resolve_class("Foo").unwrap().name(), "Foo");
        table.leave_compilation_unit().unwrap();
    }

    #[test]
    fn test_import_alias_outranks_same_package() {
        let mut table = SymbolTable::new();
        table.register_class_type(class("q.Foo", 0));
        table.register_class_type(class("p.Foo", 5));

        table.enter_compilation_unit("p").unwrap();
        assert_eq!(table.resolve_class("Foo").unwrap().name(), "p.Foo");
        table
            .register_import_class(&ClassTypeHandle::resolved("q.Foo"))
            .unwrap();
        assert_eq!(table.resolve_class("Foo").unwrap().name(), "q.Foo");
        table.leave_compilation_unit().unwrap();
    }

    #[test]
    fn test_alias_differs_from_class_simple_name() {
        let mut table = SymbolTable::new();
        table.register_class_type(class("r.Bar", 0));
        table.register_class_type(class("Baz", 5));

        table.enter_compilation_unit("p").unwrap();
        table
            .register_import_class(&ClassTypeHandle::resolved("s.Baz"))
            .unwrap();
        // The alias "Baz" points at an unknown class; the qualified match still wins.
        assert_eq!(table.resolve_class("Baz").unwrap().name(), "Baz");
        assert_eq!(table.resolve_class("r.Bar").unwrap().name(), "r.Bar");
        table.leave_compilation_unit().unwrap();
    }

    #[test]
    fn test_unknown_name_is_unresolved_handle() {
        let mut table = SymbolTable::new();
        table.enter_compilation_unit("p").unwrap();

        assert!(table.resolve_class("Missing").is_none());
        assert_eq!(
            table.resolve_type_handle("Missing"),
            TypeHandle::Class(ClassTypeHandle::unresolved("Missing"))
        );

        table
            .register_import_class(&ClassTypeHandle::unresolved("java.util.List"))
            .unwrap();
        assert_eq!(
            table.resolve_type_handle("List"),
            TypeHandle::Class(ClassTypeHandle::unresolved("java.util.List"))
        );
        assert_eq!(
            table.resolve_type_handle("double"),
            TypeHandle::Primitive(PrimitiveType::Double)
        );
        table.leave_compilation_unit().unwrap();
    }

    #[test]
    fn test_wildcard_import_is_a_snapshot() {
        let mut table = SymbolTable::new();
        table.register_class_type(class("q.Early", 0));

        table.enter_compilation_unit("p").unwrap();
        table.register_import_package("q").unwrap();
        // Registered after the import was processed.
        table.register_class_type(class("q.Late", 5));

        assert_eq!(table.resolve_class("Early").unwrap().name(), "q.Early");
        assert!(table.resolve_class("Late").is_none());
        assert_eq!(
            table.resolve_class_handle("Late"),
            ClassTypeHandle::unresolved("Late")
        );
        table.leave_compilation_unit().unwrap();

        // In package q the late class is reachable through the same-package rule.
        table.enter_compilation_unit("q").unwrap();
        table.register_import_package("q").unwrap();
        assert_eq!(table.resolve_class("Late").unwrap().name(), "q.Late");
        table.leave_compilation_unit().unwrap();
    }

    #[test]
    fn test_wildcard_import_matches_exact_package_only() {
        let mut table = SymbolTable::new();
        table.register_class_type(class("q.Foo", 0));
        table.register_class_type(class("q.sub.Bar", 5));

        table.enter_compilation_unit("p").unwrap();
        table.register_import_package("q").unwrap();
        assert!(table.resolve_class("Foo").is_some());
        assert!(table.resolve_class("Bar").is_none());
        table.leave_compilation_unit().unwrap();
    }

    #[test]
    fn test_wildcard_import_with_same_simple_name_elsewhere() {
        for order in [["q.Node", "r.Node"], ["r.Node", "q.Node"]] {
            let mut table = SymbolTable::new();
            for (index, name) in order.iter().enumerate() {
                table.register_class_type(class(name, index as u32 * 5));
            }

            table.enter_compilation_unit("p").unwrap();
            table.register_import_package("q").unwrap();
            assert_eq!(table.resolve_class("Node").unwrap().name(), "q.Node");
            table.leave_compilation_unit().unwrap();

            table.enter_compilation_unit("p").unwrap();
            table.register_import_package("r").unwrap();
            assert_eq!(table.resolve_class("Node").unwrap().name(), "r.Node");
            table.leave_compilation_unit().unwrap();
        }
    }

    #[test]
    fn test_fork_shares_root_frame_until_written() {
        let mut table = SymbolTable::new();
        table.register_class_type(class("q.Foo", 0));

        let mut fork = table.fork();
        assert!(Arc::ptr_eq(&table.frames[0], &fork.frames[0]));
        assert!(Arc::ptr_eq(table.registry(), fork.registry()));

        // Scopes entered on the fork are its own.
        fork.enter_compilation_unit("p").unwrap();
        fork.register_variable("x", class_handle("q.Foo"));
        assert!(Arc::ptr_eq(&table.frames[0], &fork.frames[0]));
        fork.leave_compilation_unit().unwrap();

        // Registering on the fork copies the root frame and the registry.
        fork.register_class_type(class("q.Bar", 5));
        assert!(!Arc::ptr_eq(&table.frames[0], &fork.frames[0]));
        assert!(table.resolve_class("q.Bar").is_none());
        assert!(fork.resolve_class("q.Bar").is_some());

        table.enter_compilation_unit("p").unwrap();
        table.register_import_package("q").unwrap();
        assert!(table.resolve_class("Bar").is_none());
        table.leave_compilation_unit().unwrap();
    }

    #[test]
    fn test_location_and_handle_lookups() {
        let mut table = SymbolTable::new();
        table.register_class_type(class("p.A", 42));

        let found = table.get_class_type_by_location(file(), Span::new(42, 43));
        assert_eq!(found.unwrap().name(), "p.A");
        assert!(table.get_class_type_by_location(file(), Span::new(42, 44)).is_none());
        assert!(
            table
                .get_class_by_handle(&ClassTypeHandle::resolved("p.A"))
                .is_some()
        );
    }

    #[test]
    fn test_unwind_restores_root_state() {
        let mut table = SymbolTable::new();
        let a = table.register_class_type(class("p.A", 0));
        table.enter_compilation_unit("p").unwrap();
        table.enter_class_scope(a);
        table.enter_scope();

        table.unwind();
        assert_eq!(table.depth(), 1);
        assert_eq!(table.class_depth(), 0);
        assert!(table.enter_compilation_unit("p").is_ok());
    }

    #[test]
    fn test_fork_shares_registry_not_environment() {
        let mut table = SymbolTable::new();
        table.register_class_type(class("q.Foo", 0));

        let mut fork = table.fork();
        assert!(Arc::ptr_eq(table.registry(), fork.registry()));
        fork.enter_compilation_unit("p").unwrap();
        assert!(table.package().is_none());

        // Root-frame classes are visible to wildcard imports on the fork as well.
        fork.register_import_package("q").unwrap();
        assert_eq!(fork.resolve_class("Foo").unwrap().name(), "q.Foo");

        fork.register_class_type(class("p.Local", 5));
        assert!(table.resolve_class("p.Local").is_none());
        assert!(fork.resolve_class("p.Local").is_some());
    }
}
