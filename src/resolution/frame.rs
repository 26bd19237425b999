use crate::symbol::{ClassType, TypeHandle};
use std::collections::HashMap;
use std::sync::Arc;

/// Bindings of one lexical scope.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    /// Types declared in this scope, keyed by qualified name.
    classes: HashMap<String, Arc<ClassType>>,
    /// Locals, parameters and fields, keyed by name.
    variables: HashMap<String, TypeHandle>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_class_type(&mut self, class: Arc<ClassType>) {
        self.classes.insert(class.handle.name.clone(), class);
    }

    pub fn register_variable(&mut self, name: impl Into<String>, ty: TypeHandle) {
        self.variables.insert(name.into(), ty);
    }

    pub fn classes(&self) -> impl Iterator<Item = &Arc<ClassType>> {
        self.classes.values()
    }

    pub fn variable_type(&self, name: &str) -> Option<&TypeHandle> {
        self.variables.get(name)
    }
}
