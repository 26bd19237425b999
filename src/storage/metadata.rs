//! Metadata describing a persisted index

use super::error::{StorageError, StorageResult};
use super::index_data::IndexData;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Current on-disk format. Bump when `IndexData` changes shape.
pub const INDEX_FORMAT_VERSION: u32 = 1;

const METADATA_FILE: &str = "index.meta";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Version of the index format
    pub version: u32,

    pub file_count: u32,
    pub class_count: u32,
    pub usage_count: u32,

    /// Files that failed to parse or resolve during the last run
    #[serde(default)]
    pub failed_files: Vec<String>,

    /// Directory the indexed paths are relative to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<PathBuf>,

    /// Last modification timestamp (UTC seconds)
    pub last_modified: u64,
}

impl IndexMetadata {
    pub fn new() -> Self {
        Self {
            version: INDEX_FORMAT_VERSION,
            file_count: 0,
            class_count: 0,
            usage_count: 0,
            failed_files: Vec::new(),
            source_root: None,
            last_modified: get_utc_timestamp(),
        }
    }

    /// Metadata matching `data`, stamped now.
    pub fn for_index(data: &IndexData, failed_files: Vec<String>) -> Self {
        Self {
            file_count: data.file_count() as u32,
            class_count: data.class_count() as u32,
            usage_count: data.usage_count() as u32,
            failed_files,
            ..Self::new()
        }
    }

    pub fn with_source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_root = Some(root.into());
        self
    }

    pub fn save(&self, base_path: &Path) -> StorageResult<()> {
        let metadata_path = base_path.join(METADATA_FILE);
        let json = serde_json::to_string_pretty(self)?;

        fs::write(&metadata_path, json).map_err(|source| StorageError::FileWrite {
            path: metadata_path,
            source,
        })
    }

    /// Load metadata, failing when it is missing or written by another format version.
    pub fn load(base_path: &Path) -> StorageResult<Self> {
        let metadata_path = base_path.join(METADATA_FILE);

        if !metadata_path.exists() {
            return Err(StorageError::IndexNotFound(base_path.to_path_buf()));
        }

        let json = fs::read_to_string(&metadata_path).map_err(|source| StorageError::FileRead {
            path: metadata_path.clone(),
            source,
        })?;

        let metadata: Self = serde_json::from_str(&json)?;
        if metadata.version != INDEX_FORMAT_VERSION {
            return Err(StorageError::VersionMismatch {
                found: metadata.version,
                expected: INDEX_FORMAT_VERSION,
            });
        }
        Ok(metadata)
    }

    pub fn exists(base_path: &Path) -> bool {
        base_path.join(METADATA_FILE).exists()
    }
}

impl Default for IndexMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// Current UTC time as seconds since the epoch
pub fn get_utc_timestamp() -> u64 {
    Utc::now().timestamp() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let metadata = IndexMetadata {
            file_count: 3,
            failed_files: vec!["Broken.java".to_string()],
            ..IndexMetadata::new()
        }
        .with_source_root("/work/project");

        metadata.save(temp_dir.path()).unwrap();
        assert!(IndexMetadata::exists(temp_dir.path()));

        let loaded = IndexMetadata::load(temp_dir.path()).unwrap();
        assert_eq!(loaded, metadata);
    }

    #[test]
    fn test_missing_metadata() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            IndexMetadata::load(temp_dir.path()),
            Err(StorageError::IndexNotFound(_))
        ));
    }

    #[test]
    fn test_version_mismatch() {
        let temp_dir = TempDir::new().unwrap();
        let metadata = IndexMetadata {
            version: INDEX_FORMAT_VERSION + 1,
            ..IndexMetadata::new()
        };
        metadata.save(temp_dir.path()).unwrap();

        assert!(matches!(
            IndexMetadata::load(temp_dir.path()),
            Err(StorageError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn test_timestamp_is_recent() {
        // 2020-01-01
        assert!(get_utc_timestamp() > 1_577_836_800);
    }
}
