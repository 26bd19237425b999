//! Declarations and the handles that reference them.
//!
//! A handle is the value stored wherever one declaration points at another: a field's
//! type, a parameter's type, the target of a usage. Handles are plain names, so an
//! unresolved reference still has a handle, it just carries `resolved = false`.

pub mod usage;

pub use usage::{MethodUsageKind, TypeUsageKind, Usage, UsageKind};

use crate::types::Location;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Member name under which constructors are registered.
pub const CONSTRUCTOR_NAME: &str = "<init>";

/// Names a class-like declaration by its qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassTypeHandle {
    pub name: String,
    pub resolved: bool,
}

impl ClassTypeHandle {
    pub fn resolved(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resolved: true,
        }
    }

    pub fn unresolved(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resolved: false,
        }
    }

    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    pub fn package(&self) -> &str {
        package_of(&self.name)
    }
}

impl fmt::Display for ClassTypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.resolved {
            f.write_str(&self.name)
        } else {
            write!(f, "{}?", self.name)
        }
    }
}

/// Qualified as `<owner>.<method>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodHandle {
    pub name: String,
}

impl MethodHandle {
    pub fn new(owner: &ClassTypeHandle, member: &str) -> Self {
        Self {
            name: member_name(&owner.name, member),
        }
    }

    pub fn member_name(&self) -> &str {
        simple_name(&self.name)
    }

    pub fn owner_name(&self) -> &str {
        package_of(&self.name)
    }

    pub fn is_constructor(&self) -> bool {
        self.member_name() == CONSTRUCTOR_NAME
    }
}

impl fmt::Display for MethodHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Qualified as `<owner>.<field>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldHandle {
    pub name: String,
}

impl FieldHandle {
    pub fn new(owner: &ClassTypeHandle, member: &str) -> Self {
        Self {
            name: member_name(&owner.name, member),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl PrimitiveType {
    pub fn parse(name: &str) -> Option<Self> {
        let primitive = match name {
            "boolean" => Self::Boolean,
            "byte" => Self::Byte,
            "char" => Self::Char,
            "short" => Self::Short,
            "int" => Self::Int,
            "long" => Self::Long,
            "float" => Self::Float,
            "double" => Self::Double,
            "void" => Self::Void,
            _ => return None,
        };
        Some(primitive)
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Char => "char",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Void => "void",
        }
    }
}

/// The type of a variable, field or parameter. Never absent: a name that could not be
/// resolved is still a `Class` handle, with `resolved = false`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeHandle {
    Primitive(PrimitiveType),
    Class(ClassTypeHandle),
}

impl TypeHandle {
    /// Handle for a type name as written, before any registry lookup.
    pub fn from_source(name: &str) -> Self {
        let name = drop_generic_types(name);
        match PrimitiveType::parse(&name) {
            Some(primitive) => Self::Primitive(primitive),
            None => Self::Class(ClassTypeHandle::unresolved(name)),
        }
    }

    pub fn as_class(&self) -> Option<&ClassTypeHandle> {
        match self {
            Self::Class(handle) => Some(handle),
            Self::Primitive(_) => None,
        }
    }

    /// True for class handles the registry could not back.
    pub fn is_unresolved_class(&self) -> bool {
        matches!(self, Self::Class(handle) if !handle.resolved)
    }
}

impl From<ClassTypeHandle> for TypeHandle {
    fn from(handle: ClassTypeHandle) -> Self {
        Self::Class(handle)
    }
}

impl From<PrimitiveType> for TypeHandle {
    fn from(primitive: PrimitiveType) -> Self {
        Self::Primitive(primitive)
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(primitive) => f.write_str(primitive.keyword()),
            Self::Class(handle) => handle.fmt(f),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Annotation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeHandle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub handle: MethodHandle,
    pub parameters: Vec<Parameter>,
    /// Location of the method's name.
    pub location: Location,
}

impl Method {
    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub handle: FieldHandle,
    pub ty: TypeHandle,
}

/// A class, interface, enum or annotation discovered by the declaration pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassType {
    pub handle: ClassTypeHandle,
    pub kind: ClassKind,
    pub methods: Vec<Method>,
    pub fields: Vec<Field>,
    /// Location of the type's name.
    pub location: Location,
    pub doc_comment: Option<String>,
}

impl ClassType {
    pub fn new(name: impl Into<String>, kind: ClassKind, location: Location) -> Self {
        Self {
            handle: ClassTypeHandle::resolved(name),
            kind,
            methods: Vec::new(),
            fields: Vec::new(),
            location,
            doc_comment: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.handle.name
    }

    /// Field name with the `<owner>.` prefix removed.
    pub fn unqualified_field_name<'a>(&self, field: &'a Field) -> &'a str {
        strip_owner(&self.handle.name, &field.handle.name)
    }

    pub fn add_method(&mut self, member: &str, parameters: Vec<Parameter>, location: Location) {
        let handle = MethodHandle::new(&self.handle, member);
        self.methods.push(Method {
            handle,
            parameters,
            location,
        });
    }

    pub fn add_field(&mut self, member: &str, ty: TypeHandle) {
        let handle = FieldHandle::new(&self.handle, member);
        self.fields.push(Field { handle, ty });
    }

    pub fn has_constructor(&self) -> bool {
        self.methods.iter().any(|m| m.handle.is_constructor())
    }
}

/// `owner.member`, or just `member` for an empty owner.
pub fn member_name(owner: &str, member: &str) -> String {
    if owner.is_empty() {
        member.to_string()
    } else {
        format!("{owner}.{member}")
    }
}

/// Last dotted segment of a qualified name.
pub fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

/// Everything before the last dot; empty for names without one.
pub fn package_of(qualified: &str) -> &str {
    qualified
        .rsplit_once('.')
        .map(|(package, _)| package)
        .unwrap_or("")
}

fn strip_owner<'a>(owner: &str, qualified: &'a str) -> &'a str {
    qualified
        .strip_prefix(owner)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(qualified)
}

/// Removes generic argument lists: `Map<String, List<Foo>>` becomes `Map`.
pub fn drop_generic_types(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut depth = 0usize;
    for c in name.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 && !c.is_whitespace() => result.push(c),
            _ => {}
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FileId, Span};

    fn location(from: u32) -> Location {
        Location::new(FileId::new(1).unwrap(), Span::new(from, from + 1))
    }

    #[test]
    fn test_handle_equality_includes_resolved_flag() {
        assert_eq!(
            ClassTypeHandle::resolved("q.Foo"),
            ClassTypeHandle::resolved("q.Foo")
        );
        assert_ne!(
            ClassTypeHandle::resolved("q.Foo"),
            ClassTypeHandle::unresolved("q.Foo")
        );
    }

    #[test]
    fn test_qualified_name_helpers() {
        assert_eq!(simple_name("a.b.C"), "C");
        assert_eq!(simple_name("C"), "C");
        assert_eq!(package_of("a.b.C"), "a.b");
        assert_eq!(package_of("C"), "");
        assert_eq!(member_name("", "Foo"), "Foo");
        assert_eq!(member_name("p", "Foo"), "p.Foo");
    }

    #[test]
    fn test_drop_generic_types() {
        assert_eq!(drop_generic_types("List<String>"), "List");
        assert_eq!(drop_generic_types("Map<String, List<Foo>>"), "Map");
        assert_eq!(drop_generic_types("java.util.List<T>"), "java.util.List");
        assert_eq!(drop_generic_types("Foo[]"), "Foo[]");
        assert_eq!(drop_generic_types("Outer<A>.Inner<B>"), "Outer.Inner");
    }

    #[test]
    fn test_type_handle_from_source() {
        assert_eq!(
            TypeHandle::from_source("int"),
            TypeHandle::Primitive(PrimitiveType::Int)
        );
        let handle = TypeHandle::from_source("List<String>");
        assert_eq!(handle, ClassTypeHandle::unresolved("List").into());
        assert!(handle.is_unresolved_class());
    }

    #[test]
    fn test_class_members() {
        let mut class = ClassType::new("p.A", ClassKind::Class, location(0));
        class.add_field("count", PrimitiveType::Int.into());
        class.add_method("run", Vec::new(), location(5));
        class.add_method(CONSTRUCTOR_NAME, Vec::new(), location(0));

        assert_eq!(class.fields[0].handle.name, "p.A.count");
        assert_eq!(class.unqualified_field_name(&class.fields[0]), "count");
        assert_eq!(class.methods[0].handle.name, "p.A.run");
        assert_eq!(class.methods[0].handle.owner_name(), "p.A");
        assert!(!class.methods[0].handle.is_constructor());
        assert!(class.methods[1].handle.is_constructor());
        assert!(class.has_constructor());
    }
}
