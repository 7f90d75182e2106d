//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::RegistrySnapshot;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Malformed data: {0}")]
    Malformed(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Backends persist whole snapshots. A load that encounters an individual bad
/// link or category skips it with a warning; only document-level problems
/// (unreadable file, broken database) are returned as errors.
pub trait Storage: Send {
    /// Returns true if a previously saved registry is present
    fn exists(&self) -> bool;

    /// Loads the most recently saved snapshot
    fn load(&self) -> StorageResult<RegistrySnapshot>;

    /// Replaces the stored snapshot
    fn save(&mut self, snapshot: &RegistrySnapshot) -> StorageResult<()>;

    /// Human-readable location of the store, for logging
    fn describe(&self) -> String;
}
