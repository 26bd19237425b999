//! Persistence of a built index
//!
//! An index directory holds two files: `index.json` with the serialized
//! [`IndexData`] and `index.meta` with counts and the format version. The metadata
//! is written last, so an index without it is treated as absent.

use super::error::{StorageError, StorageResult};
use super::index_data::IndexData;
use super::metadata::IndexMetadata;
use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

const DATA_FILE: &str = "index.json";

/// Manages persistence of the index
#[derive(Debug)]
pub struct IndexPersistence {
    base_path: PathBuf,
}

impl IndexPersistence {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Write `data` and `metadata`, replacing any previous index.
    ///
    /// The counts in `metadata` are recomputed from `data`.
    #[must_use = "Save errors should be handled to ensure data is persisted"]
    pub fn save(&self, data: &IndexData, metadata: IndexMetadata) -> StorageResult<IndexMetadata> {
        fs::create_dir_all(&self.base_path).map_err(|source| StorageError::FileWrite {
            path: self.base_path.clone(),
            source,
        })?;

        let data_path = self.base_path.join(DATA_FILE);
        let file = fs::File::create(&data_path).map_err(|source| StorageError::FileWrite {
            path: data_path.clone(),
            source,
        })?;
        serde_json::to_writer(BufWriter::new(file), data)?;

        let metadata = IndexMetadata {
            file_count: data.file_count() as u32,
            class_count: data.class_count() as u32,
            usage_count: data.usage_count() as u32,
            ..metadata
        };
        metadata.save(&self.base_path)?;

        tracing::debug!(
            target: "storage",
            "saved {} classes and {} usages to {}",
            metadata.class_count,
            metadata.usage_count,
            self.base_path.display()
        );
        Ok(metadata)
    }

    /// Load the index and its metadata.
    #[must_use = "Load errors should be handled appropriately"]
    pub fn load(&self) -> StorageResult<(IndexData, IndexMetadata)> {
        let metadata = IndexMetadata::load(&self.base_path)?;

        let data_path = self.base_path.join(DATA_FILE);
        let file = fs::File::open(&data_path).map_err(|source| StorageError::FileRead {
            path: data_path.clone(),
            source,
        })?;
        let data: IndexData = serde_json::from_reader(BufReader::new(file))?;

        tracing::debug!(
            target: "storage",
            "loaded {} files from {}",
            data.file_count(),
            self.base_path.display()
        );
        Ok((data, metadata))
    }

    pub fn exists(&self) -> bool {
        IndexMetadata::exists(&self.base_path) && self.base_path.join(DATA_FILE).exists()
    }

    /// Delete the persisted index
    pub fn clear(&self) -> Result<(), std::io::Error> {
        if self.base_path.exists() {
            fs::remove_dir_all(&self.base_path)?;
        }
        Ok(())
    }
}
