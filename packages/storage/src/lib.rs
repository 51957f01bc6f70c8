// ABOUTME: SQLite persistence for generated SDLC datasets
// ABOUTME: Dependency-ordered bulk load, range queries by project and time, and snapshot reads

pub mod cached;
mod rows;
pub mod snapshot;
pub mod store;

use sdlcgen_core::ConfigurationError;
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl From<ConfigurationError> for StorageError {
    fn from(e: ConfigurationError) -> Self {
        StorageError::Corrupt(e.to_string())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

// Re-export main types
pub use cached::CachedCommitReader;
pub use snapshot::{read_json_snapshot, write_json_snapshot};
pub use store::SdlcStore;
