//! Output module for progress reporting and run summaries
//!
//! This module handles:
//! - Structured progress events emitted during discovery and extraction
//! - The reports both entry points return
//! - Listing the CSV files produced under the output directory

mod progress;
pub mod stats;

pub use progress::{ProgressEvent, ProgressReporter};
pub use stats::{list_result_files, ArtifactKind, DiscoveryReport, ExtractionReport, ResultFile};
