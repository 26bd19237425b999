//! Source front ends.
//!
//! A front end turns source text into the [`syntax`](crate::syntax) tree consumed by
//! the declaration pass and the cross-reference resolver.

pub mod java;
pub mod parser;

pub use java::JavaParser;
pub use parser::{MAX_AST_DEPTH, ParseError, ParseResult, check_recursion_depth};
