//! Error types for scope management and cross-reference resolution.

use crate::types::Location;
use thiserror::Error;

/// Misuse of the symbol table's scope lifecycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SymbolTableError {
    #[error("Cannot enter compilation unit for package '{requested}': '{active}' is still active")]
    CompilationUnitActive { active: String, requested: String },

    #[error("No compilation unit is active")]
    NoCompilationUnit,

    #[error("Cannot leave the root frame")]
    RootFrame,

    #[error("No class scope to leave")]
    NoClassScope,
}

/// Failure resolving one file.
///
/// Every variant means the declaration pass and the resolver disagree about the
/// file, so the file's usages cannot be trusted and the file is dropped. Unresolved
/// names and ambiguous calls are not errors; they only suppress usages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Type '{name}' at {location} was not discovered by the declaration pass")]
    MissingTypeDeclaration { name: String, location: Location },

    #[error("Method '{name}' at {location} was not discovered in class '{class}'")]
    MissingMethodDeclaration {
        name: String,
        class: String,
        location: Location,
    },

    #[error("'{name}' at {location} is not inside any class")]
    NoEnclosingClass { name: String, location: Location },

    #[error("Scope error: {0}")]
    Scope(#[from] SymbolTableError),
}

impl ResolveError {
    /// True when a declaration the resolver relies on is absent.
    pub fn is_invariant_violation(&self) -> bool {
        !matches!(self, Self::Scope(_))
    }
}

pub type ResolveResult<T> = Result<T, ResolveError>;
