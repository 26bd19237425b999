//! Index command - index a directory of Java sources and persist the result.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Settings;
use crate::indexing::ProjectIndexer;
use crate::storage::{IndexMetadata, IndexPersistence};

/// Run the index command.
pub fn run(path: Option<PathBuf>, threads: Option<usize>, mut config: Settings) -> Result<()> {
    if let Some(threads) = threads {
        config.indexing.parallel_threads = threads;
    }
    let root = path.unwrap_or_else(|| config.source_root());
    let root = root
        .canonicalize()
        .with_context(|| format!("Cannot index {}", root.display()))?;

    let persistence = IndexPersistence::new(config.index_dir());
    let indexer = ProjectIndexer::new(Arc::new(config));
    let index = indexer
        .index_directory(&root)
        .with_context(|| format!("Indexing {} failed", root.display()))?;

    let metadata = IndexMetadata::for_index(&index.data, index.failed_files.clone())
        .with_source_root(&root);
    persistence
        .save(&index.data, metadata)
        .context("Could not save index")?;

    let stats = &index.stats;
    println!("Indexed {} file(s) from {}", stats.files_indexed, root.display());
    println!("  Classes: {}", stats.classes);
    println!("  Usages:  {}", stats.usages);
    if stats.failures() > 0 {
        println!("  Failed:  {}", stats.failures());
        for path in &index.failed_files {
            println!("    {path}");
        }
    }
    println!("Elapsed: {:.2?}", stats.elapsed);
    println!("\nIndex saved to: {}", persistence.base_path().display());
    Ok(())
}
