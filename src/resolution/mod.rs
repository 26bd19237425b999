//! Scope-aware name resolution.
//!
//! [`SymbolTable`] owns the declarations of a project together with the lexical
//! environment of the file being resolved. [`CrossReferenceResolver`] walks one file
//! with a table and produces its [`Usage`](crate::symbol::Usage) records.

pub mod error;
pub mod frame;
pub mod registry;
pub mod resolver;
pub mod symbol_table;

pub use error::{ResolveError, ResolveResult, SymbolTableError};
pub use frame::Frame;
pub use registry::ClassRegistry;
pub use resolver::{CrossReferenceResolver, extract_usages};
pub use symbol_table::SymbolTable;
