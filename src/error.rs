//! Crate-level error type for indexing a project.
//!
//! Per-file parse and resolution failures are not errors here: the indexer logs them
//! and counts them in its stats. `IndexError` covers what stops a whole run.

use crate::parsing::ParseError;
use crate::resolution::SymbolTableError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Failed to set up the Java parser: {0}")]
    ParserSetup(#[from] ParseError),

    #[error("Symbol table misuse while linking declarations: {0}")]
    SymbolTable(#[from] SymbolTableError),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),

    #[error("{0}")]
    General(String),
}

pub type IndexResult<T> = Result<T, IndexError>;
