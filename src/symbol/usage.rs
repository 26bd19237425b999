//! Usage records emitted by the cross-reference resolver.

use super::{MethodHandle, TypeHandle};
use crate::types::Location;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeUsageKind {
    /// The declared type of a local variable.
    LocalVariable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MethodUsageKind {
    MethodCall,
    InstanceCreation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UsageKind {
    Type {
        ty: TypeHandle,
        kind: TypeUsageKind,
    },
    Method {
        method: MethodHandle,
        kind: MethodUsageKind,
        /// Where the called method or constructor is declared. Overloads share a
        /// handle, so this is what tells them apart.
        definition: Location,
    },
}

/// One resolved reference from a source location to a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub kind: UsageKind,
    pub location: Location,
    /// The source line containing the reference.
    pub snippet: String,
}

impl Usage {
    pub fn type_usage(
        ty: TypeHandle,
        kind: TypeUsageKind,
        location: Location,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            kind: UsageKind::Type { ty, kind },
            location,
            snippet: snippet.into(),
        }
    }

    pub fn method_usage(
        method: MethodHandle,
        kind: MethodUsageKind,
        definition: Location,
        location: Location,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            kind: UsageKind::Method {
                method,
                kind,
                definition,
            },
            location,
            snippet: snippet.into(),
        }
    }

    /// Qualified name of whatever the usage points at.
    pub fn target_name(&self) -> String {
        match &self.kind {
            UsageKind::Type { ty, .. } => match ty {
                TypeHandle::Class(handle) => handle.name.clone(),
                TypeHandle::Primitive(primitive) => primitive.keyword().to_string(),
            },
            UsageKind::Method { method, .. } => method.name.clone(),
        }
    }

    pub fn as_method(&self) -> Option<(&MethodHandle, MethodUsageKind)> {
        match &self.kind {
            UsageKind::Method { method, kind, .. } => Some((method, *kind)),
            UsageKind::Type { .. } => None,
        }
    }

    /// Declaration site of the method or constructor a method usage points at.
    pub fn method_definition(&self) -> Option<Location> {
        match &self.kind {
            UsageKind::Method { definition, .. } => Some(*definition),
            UsageKind::Type { .. } => None,
        }
    }

    pub fn as_type(&self) -> Option<(&TypeHandle, TypeUsageKind)> {
        match &self.kind {
            UsageKind::Type { ty, kind } => Some((ty, *kind)),
            UsageKind::Method { .. } => None,
        }
    }
}

impl fmt::Display for TypeUsageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalVariable => f.write_str("local variable"),
        }
    }
}

impl fmt::Display for MethodUsageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MethodCall => f.write_str("method call"),
            Self::InstanceCreation => f.write_str("instance creation"),
        }
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            UsageKind::Type { ty, kind } => write!(f, "{kind} {ty} at {}", self.location),
            UsageKind::Method { method, kind, .. } => {
                write!(f, "{kind} {method} at {}", self.location)
            }
        }
    }
}
