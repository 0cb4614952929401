//! Storage module for persisting harvest results
//!
//! This module handles all durable output of the harvester:
//! - Discovered listing URLs, appended per (region, category)
//! - Extracted business records, appended and flushed one row at a time
//! - The failed-URL list of the latest extraction run
//! - Deterministic artifact naming shared by discovery and extraction

mod csv_sink;
mod paths;
mod traits;

pub use csv_sink::{count_rows, read_url_column, CsvSink, NOT_AVAILABLE, RECORD_HEADER, URL_HEADER};
pub use paths::{file_stem, state_folder, ArtifactPaths};
pub use traits::{PersistenceSink, StorageError, StorageResult};

use std::path::Path;

/// Opens the CSV sink rooted at `output_dir`
///
/// # Arguments
///
/// * `output_dir` - Directory under which per-state folders are created
pub fn open_sink(output_dir: &Path) -> CsvSink {
    CsvSink::new(output_dir)
}
