pub mod error;
pub mod index_data;
pub mod metadata;
pub mod persistence;

pub use error::{StorageError, StorageResult};
pub use index_data::IndexData;
pub use metadata::{INDEX_FORMAT_VERSION, IndexMetadata, get_utc_timestamp};
pub use persistence::IndexPersistence;
