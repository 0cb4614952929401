//! Storage traits and error types
//!
//! This module defines the trait interface for persistence backends and
//! associated error types.

use crate::model::{BusinessRecord, Category, Region};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{path} has no header row")]
    MissingHeader { path: PathBuf },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for durable result storage
///
/// Every artifact is keyed by (region, category) so an extraction run finds
/// the URL set an earlier discovery run produced. Implementations must create
/// the destination on first use, flush each row before returning and
/// serialize concurrent writers to the same artifact.
///
/// URL and record writes append. Re-running discovery for the same identity
/// therefore accumulates duplicate URLs; deduplicating against earlier output
/// is the caller's job.
pub trait PersistenceSink: Send + Sync {
    /// Appends discovered listing URLs
    ///
    /// # Returns
    ///
    /// The path of the URL artifact
    fn append_urls(&self, urls: &[String], region: &Region, category: &Category) -> StorageResult<PathBuf>;

    /// Appends one extracted record
    fn append_record(&self, record: &BusinessRecord) -> StorageResult<()>;

    /// Replaces the failed-URL artifact with `urls`
    ///
    /// Unlike the other artifacts this one reflects only the latest
    /// extraction run. An empty slice leaves a header-only file.
    fn write_failed(&self, urls: &[String], region: &Region, category: &Category) -> StorageResult<PathBuf>;

    /// Reads back the URL artifact, in file order
    ///
    /// Returns `Ok(None)` when no discovery run has written it yet.
    fn read_urls(&self, region: &Region, category: &Category) -> StorageResult<Option<Vec<String>>>;
}
