//! Java front end built on tree-sitter-java

pub mod parser;

pub use parser::JavaParser;
