pub mod declarations;
pub mod project;
pub mod walker;

pub use declarations::{collect_declarations, link_declarations};
pub use project::{IndexStats, ProjectIndex, ProjectIndexer, SourceFile};
pub use walker::FileWalker;
