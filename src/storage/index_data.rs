//! Serializable result of indexing a project, and the queries over it.
//!
//! This is plain data: files, the declarations the declaration pass found, and the
//! usages the resolver emitted.

use crate::symbol::{ClassType, Method, TypeHandle, Usage, UsageKind, package_of};
use crate::types::{FileId, Location};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct IndexData {
    /// Source path -> file id, in id order.
    pub files: IndexMap<String, FileId>,
    /// Qualified name -> class.
    pub classes: IndexMap<String, ClassType>,
    /// Usages of every file, files in id order, each file in traversal order.
    pub usages: Vec<Usage>,
}

impl IndexData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_by_path(&self, path: &str) -> Option<FileId> {
        self.files.get(path).copied()
    }

    pub fn path_of(&self, file: FileId) -> Option<&str> {
        self.files
            .iter()
            .find(|(_, id)| **id == file)
            .map(|(path, _)| path.as_str())
    }

    /// Classes named `name`: the class with that qualified name, or else every class
    /// with that simple name.
    pub fn find_class(&self, name: &str) -> Vec<&ClassType> {
        if let Some(class) = self.classes.get(name) {
            return vec![class];
        }
        self.classes
            .values()
            .filter(|class| class.handle.simple_name() == name)
            .collect()
    }

    /// Every overload with the qualified name `owner.member`.
    pub fn find_method(&self, qualified: &str) -> Vec<&Method> {
        self.classes
            .get(package_of(qualified))
            .map(|class| {
                class
                    .methods
                    .iter()
                    .filter(|method| method.handle.name == qualified)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Usages pointing at the method or class with the qualified name `qualified`.
    ///
    /// Method usages match on the method handle, local-variable usages on a resolved
    /// class handle. `Foo.<init>` finds instance creations of `Foo`.
    pub fn references_to(&self, qualified: &str) -> Vec<&Usage> {
        self.usages
            .iter()
            .filter(|usage| match &usage.kind {
                UsageKind::Method { method, .. } => method.name == qualified,
                UsageKind::Type {
                    ty: TypeHandle::Class(handle),
                    ..
                } => handle.resolved && handle.name == qualified,
                UsageKind::Type { .. } => false,
            })
            .collect()
    }

    pub fn usages_in(&self, file: FileId) -> impl Iterator<Item = &Usage> {
        self.usages
            .iter()
            .filter(move |usage| usage.location.file == file)
    }

    /// The innermost usage whose span covers `offset` in `file`.
    pub fn usage_at(&self, file: FileId, offset: u32) -> Option<&Usage> {
        self.usages_in(file)
            .filter(|usage| usage.location.span.contains(offset))
            .min_by_key(|usage| usage.location.span.len())
    }

    /// Declaration site of whatever `usage` points at.
    pub fn definition_of(&self, usage: &Usage) -> Option<Location> {
        match &usage.kind {
            UsageKind::Method { definition, .. } => Some(*definition),
            UsageKind::Type {
                ty: TypeHandle::Class(handle),
                ..
            } if handle.resolved => self.classes.get(&handle.name).map(|class| class.location),
            UsageKind::Type { .. } => None,
        }
    }

    /// Declaration site of the reference at `offset` in `file`.
    pub fn definition_at(&self, file: FileId, offset: u32) -> Option<Location> {
        self.usage_at(file, offset)
            .and_then(|usage| self.definition_of(usage))
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn usage_count(&self) -> usize {
        self.usages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{
        CONSTRUCTOR_NAME, ClassKind, ClassTypeHandle, MethodUsageKind, Parameter, PrimitiveType,
        TypeUsageKind,
    };
    use crate::types::Span;

    fn file(id: u32) -> FileId {
        FileId::new(id).unwrap()
    }

    fn at(id: u32, from: u32, to: u32) -> Location {
        Location::new(file(id), Span::new(from, to))
    }

    /// `q.Foo` declared in file 1 with `bar()` and `bar(int)`, used from file 2.
    fn sample() -> IndexData {
        let mut data = IndexData::new();
        data.files.insert("q/Foo.java".to_string(), file(1));
        data.files.insert("p/A.java".to_string(), file(2));

        let mut foo = ClassType::new("q.Foo", ClassKind::Class, at(1, 13, 16));
        foo.add_method(CONSTRUCTOR_NAME, Vec::new(), at(1, 13, 16));
        foo.add_method("bar", Vec::new(), at(1, 30, 33));
        foo.add_method(
            "bar",
            vec![Parameter {
                name: "x".to_string(),
                ty: PrimitiveType::Int.into(),
            }],
            at(1, 50, 53),
        );
        let bar_one = foo.methods[2].clone();
        data.classes.insert(foo.name().to_string(), foo.clone());

        data.usages = vec![
            Usage::type_usage(
                ClassTypeHandle::resolved("q.Foo").into(),
                TypeUsageKind::LocalVariable,
                at(2, 40, 43),
                "Foo x = new Foo();",
            ),
            Usage::method_usage(
                foo.methods[0].handle.clone(),
                MethodUsageKind::InstanceCreation,
                foo.methods[0].location,
                at(2, 52, 55),
                "Foo x = new Foo();",
            ),
            Usage::method_usage(
                bar_one.handle.clone(),
                MethodUsageKind::MethodCall,
                bar_one.location,
                at(2, 70, 73),
                "x.bar(1);",
            ),
            Usage::type_usage(
                ClassTypeHandle::unresolved("Missing").into(),
                TypeUsageKind::LocalVariable,
                at(2, 90, 97),
                "Missing m;",
            ),
        ];
        data
    }

    #[test]
    fn test_file_lookups() {
        let data = sample();
        assert_eq!(data.file_by_path("p/A.java"), Some(file(2)));
        assert_eq!(data.path_of(file(1)), Some("q/Foo.java"));
        assert!(data.file_by_path("nope.java").is_none());
        assert_eq!(data.usages_in(file(2)).count(), 4);
        assert_eq!(data.usages_in(file(1)).count(), 0);
    }

    #[test]
    fn test_find_class_and_method() {
        let data = sample();
        assert_eq!(data.find_class("q.Foo").len(), 1);
        assert_eq!(data.find_class("Foo")[0].name(), "q.Foo");
        assert!(data.find_class("Bar").is_empty());

        assert_eq!(data.find_method("q.Foo.bar").len(), 2);
        assert_eq!(data.find_method("q.Foo.<init>").len(), 1);
        assert!(data.find_method("q.Foo.baz").is_empty());
    }

    #[test]
    fn test_references_to() {
        let data = sample();
        assert_eq!(data.references_to("q.Foo").len(), 1);
        assert_eq!(data.references_to("q.Foo.bar").len(), 1);
        assert_eq!(data.references_to("q.Foo.<init>").len(), 1);
        // Unresolved handles never count as references.
        assert!(data.references_to("Missing").is_empty());
    }

    #[test]
    fn test_definition_at() {
        let data = sample();

        assert_eq!(data.definition_at(file(2), 41), Some(at(1, 13, 16)));
        assert_eq!(data.definition_at(file(2), 52), Some(at(1, 13, 16)));
        // The overload taking one argument, not the first `bar`.
        assert_eq!(data.definition_at(file(2), 72), Some(at(1, 50, 53)));
        assert_eq!(data.definition_at(file(2), 73), None);
        assert_eq!(data.definition_at(file(2), 92), None);
        assert!(data.usage_at(file(2), 92).is_some());
    }

    #[test]
    fn test_json_round_trip_keeps_order() {
        let data = sample();
        let json = serde_json::to_string(&data).unwrap();
        let loaded: IndexData = serde_json::from_str(&json).unwrap();

        let paths: Vec<_> = loaded.files.keys().cloned().collect();
        assert_eq!(paths, vec!["q/Foo.java", "p/A.java"]);
        assert_eq!(loaded.usages, data.usages);
        assert_eq!(loaded.classes["q.Foo"], data.classes["q.Foo"]);
    }
}
