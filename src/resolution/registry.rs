//! Global registry of every declaration discovered in a project.

use crate::symbol::{ClassType, ClassTypeHandle};
use crate::types::Location;
use std::collections::HashMap;
use std::sync::Arc;

/// All classes seen so far, reachable by qualified name, by handle and by the location
/// of their name.
///
/// Cloning is shallow: classes are shared through `Arc`.
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    by_name: HashMap<String, Arc<ClassType>>,
    by_handle: HashMap<ClassTypeHandle, Arc<ClassType>>,
    by_location: HashMap<Location, Arc<ClassType>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `class` under all three keys. Registering a class again under the same
    /// handle replaces the earlier entry.
    pub fn insert(&mut self, class: Arc<ClassType>) {
        if let Some(previous) = self.by_handle.get(&class.handle) {
            if previous.location != class.location {
                self.by_location.remove(&previous.location);
            }
        }
        self.by_name.insert(class.handle.name.clone(), Arc::clone(&class));
        self.by_handle.insert(class.handle.clone(), Arc::clone(&class));
        self.by_location.insert(class.location, class);
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Arc<ClassType>> {
        self.by_name.get(name)
    }

    pub fn get_by_handle(&self, handle: &ClassTypeHandle) -> Option<&Arc<ClassType>> {
        self.by_handle.get(handle)
    }

    pub fn get_by_location(&self, location: &Location) -> Option<&Arc<ClassType>> {
        self.by_location.get(location)
    }

    pub fn classes(&self) -> impl Iterator<Item = &Arc<ClassType>> {
        self.by_handle.values()
    }

    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::ClassKind;
    use crate::types::{FileId, Span};

    fn at(from: u32) -> Location {
        Location::new(FileId::new(1).unwrap(), Span::new(from, from + 3))
    }

    #[test]
    fn test_lookup_by_every_key() {
        let mut registry = ClassRegistry::new();
        registry.insert(Arc::new(ClassType::new("q.Foo", ClassKind::Class, at(10))));

        assert_eq!(registry.len(), 1);
        assert!(registry.get_by_name("q.Foo").is_some());
        assert!(
            registry
                .get_by_handle(&ClassTypeHandle::resolved("q.Foo"))
                .is_some()
        );
        assert!(
            registry
                .get_by_handle(&ClassTypeHandle::unresolved("q.Foo"))
                .is_none()
        );
        assert_eq!(registry.get_by_location(&at(10)).unwrap().name(), "q.Foo");
        assert!(registry.get_by_location(&at(11)).is_none());
    }

    #[test]
    fn test_reinsert_replaces_entry() {
        let mut registry = ClassRegistry::new();
        registry.insert(Arc::new(ClassType::new("q.Foo", ClassKind::Class, at(10))));

        let mut updated = ClassType::new("q.Foo", ClassKind::Class, at(10));
        updated.add_field("x", crate::symbol::PrimitiveType::Int.into());
        registry.insert(Arc::new(updated));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get_by_name("q.Foo").unwrap().fields.len(), 1);
        assert_eq!(registry.get_by_location(&at(10)).unwrap().fields.len(), 1);
    }
}
