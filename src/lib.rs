pub mod cli;
pub mod config;
pub mod error;
pub mod indexing;
pub mod logging;
pub mod parsing;
pub mod resolution;
pub mod storage;
pub mod symbol;
pub mod syntax;
pub mod types;

pub use config::Settings;
pub use error::{IndexError, IndexResult};
pub use indexing::{ProjectIndex, ProjectIndexer, SourceFile};
pub use parsing::JavaParser;
pub use resolution::{CrossReferenceResolver, SymbolTable, extract_usages};
pub use storage::{IndexData, IndexPersistence};
pub use symbol::{ClassType, ClassTypeHandle, MethodHandle, TypeHandle, Usage, UsageKind};
pub use types::{FileId, Location, Span};
