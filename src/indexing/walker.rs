//! File system walker for discovering source files to index
//!
//! This module provides directory traversal with support for:
//! - .gitignore rules
//! - Custom ignore patterns from configuration
//! - Extension filtering
//! - Hidden file handling
//!
//! Results are sorted so file ids are stable across runs.

use crate::config::IndexingConfig;
use ignore::WalkBuilder;
use ignore::overrides::OverrideBuilder;
use std::path::{Path, PathBuf};

/// Name of the project-local ignore file, read in addition to `.gitignore`.
pub const IGNORE_FILE: &str = ".codexrefignore";

/// Walks directories to find source files to index
pub struct FileWalker {
    config: IndexingConfig,
}

impl FileWalker {
    pub fn new(config: IndexingConfig) -> Self {
        Self { config }
    }

    /// Source files under `root`, sorted by path.
    pub fn walk(&self, root: &Path) -> Vec<PathBuf> {
        let mut builder = WalkBuilder::new(root);

        builder
            .hidden(true) // Skip hidden files and directories
            .git_ignore(true) // Respect .gitignore files
            .git_global(true) // Respect global gitignore
            .git_exclude(true) // Respect .git/info/exclude
            .follow_links(false)
            .max_depth(None)
            .require_git(false) // Allow gitignore to work in non-git directories
            .add_custom_ignore_filename(IGNORE_FILE);

        // Overrides are the way to add glob patterns programmatically
        let mut override_builder = OverrideBuilder::new(root);
        for pattern in &self.config.ignore_patterns {
            // Add as exclusion pattern (prefix with !)
            if let Err(e) = override_builder.add(&format!("!{pattern}")) {
                tracing::warn!(target: "indexer", "invalid ignore pattern '{pattern}': {e}");
            }
        }
        match override_builder.build() {
            Ok(overrides) => {
                builder.overrides(overrides);
            }
            Err(e) => tracing::warn!(target: "indexer", "ignore patterns not applied: {e}"),
        }

        let mut files: Vec<PathBuf> = builder
            .build()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::debug!(target: "indexer", "skipping unreadable entry: {e}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .map(|entry| entry.into_path())
            .filter(|path| self.config.accepts(path))
            .collect();

        files.sort();
        files
    }

    /// Count files that would be indexed (useful for dry runs)
    pub fn count_files(&self, root: &Path) -> usize {
        self.walk(root).len()
    }
}
