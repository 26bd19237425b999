//! Shared parser plumbing: errors and the recursion guard used by the lowering.

use thiserror::Error;
use tree_sitter::Node;

/// Deepest syntax node the lowering descends into.
///
/// Deeper subtrees are skipped, which only loses the usages inside them.
pub const MAX_AST_DEPTH: usize = 512;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to set language: {0}")]
    LanguageSetup(String),

    #[error("Failed to parse code")]
    ParseFailed,
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Returns false, and logs, once `depth` exceeds [`MAX_AST_DEPTH`].
pub fn check_recursion_depth(depth: usize, node: Node) -> bool {
    if depth > MAX_AST_DEPTH {
        let start = node.start_position();
        tracing::warn!(
            target: "parser",
            "maximum syntax depth {MAX_AST_DEPTH} exceeded at line {}:{}, skipping {}",
            start.row + 1,
            start.column + 1,
            node.kind()
        );
        return false;
    }
    true
}
