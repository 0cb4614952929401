//! Run reports and result-file listing
//!
//! This module provides the summaries both entry points return and the
//! listing of produced CSV files used by the `results` command.

use crate::state::StopReason;
use crate::storage::{count_rows, StorageResult};
use crate::model::is_state_folder;
use chrono::{DateTime, Local};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Summary of a discovery run
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryReport {
    /// Where the URL set is (or would be) persisted
    pub path: PathBuf,

    /// Unique URLs found in this run
    pub url_count: usize,

    /// Result pages requested
    pub pages_visited: u32,

    pub stop_reason: StopReason,

    /// False when nothing was found and no file was touched
    pub persisted: bool,
}

impl fmt::Display for DiscoveryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} URLs from {} pages (stopped: {})",
            self.url_count, self.pages_visited, self.stop_reason
        )?;
        if self.persisted {
            write!(f, " -> {}", self.path.display())
        } else {
            write!(f, ", nothing written")
        }
    }
}

/// Summary of an extraction run
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    /// The record file rows were appended to
    pub path: PathBuf,

    /// The failed-URL file of this run
    pub failed_path: PathBuf,

    /// Records appended in this run
    pub record_count: usize,

    /// URLs that exhausted retries or had no business name
    pub failed_count: usize,

    /// URLs left unprocessed because the run was cancelled
    pub skipped: usize,

    pub cancelled: bool,
}

impl fmt::Display for ExtractionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records, {} failed -> {}",
            self.record_count,
            self.failed_count,
            self.path.display()
        )?;
        if self.cancelled {
            write!(f, " (cancelled, {} skipped)", self.skipped)?;
        }
        Ok(())
    }
}

/// Kind of a produced CSV artifact, inferred from its file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ArtifactKind {
    Urls,
    Records,
    Failed,
}

impl ArtifactKind {
    pub fn from_file_name(name: &str) -> Option<Self> {
        if !name.ends_with(".csv") {
            None
        } else if name.ends_with("_urls.csv") {
            Some(Self::Urls)
        } else if name.ends_with("_failed.csv") {
            Some(Self::Failed)
        } else {
            Some(Self::Records)
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Urls => "urls",
            Self::Records => "records",
            Self::Failed => "failed",
        }
    }
}

/// One CSV file found under the output directory
#[derive(Debug, Clone)]
pub struct ResultFile {
    /// State folder the file lives in
    pub state: String,
    pub path: PathBuf,
    pub kind: ArtifactKind,

    /// Data rows, header excluded
    pub rows: usize,
    pub modified: Option<DateTime<Local>>,
}

/// Lists produced CSV files, grouped by state folder
///
/// # Arguments
///
/// * `output_dir` - The configured output root
/// * `state` - Restrict the listing to one state code
///
/// # Returns
///
/// Files sorted by state, then file name. A missing output directory yields
/// an empty list.
pub fn list_result_files(output_dir: &Path, state: Option<&str>) -> StorageResult<Vec<ResultFile>> {
    let mut files = Vec::new();
    if !output_dir.is_dir() {
        return Ok(files);
    }

    for entry in fs::read_dir(output_dir)? {
        let entry = entry?;
        let folder = entry.file_name().to_string_lossy().into_owned();

        if !entry.file_type()?.is_dir() || !is_state_folder(&folder) {
            continue;
        }
        if state.is_some_and(|wanted| !wanted.eq_ignore_ascii_case(&folder)) {
            continue;
        }

        for file in fs::read_dir(entry.path())? {
            let file = file?;
            let name = file.file_name().to_string_lossy().into_owned();
            let Some(kind) = ArtifactKind::from_file_name(&name) else {
                continue;
            };

            let path = file.path();
            let rows = match count_rows(&path) {
                Ok(rows) => rows,
                Err(e) => {
                    tracing::warn!("Could not read {}: {}", path.display(), e);
                    0
                }
            };
            let modified = file
                .metadata()
                .and_then(|meta| meta.modified())
                .ok()
                .map(DateTime::<Local>::from);

            files.push(ResultFile {
                state: folder.clone(),
                path,
                kind,
                rows,
                modified,
            });
        }
    }

    files.sort_by(|a, b| a.state.cmp(&b.state).then_with(|| a.path.cmp(&b.path)));
    Ok(files)
}
