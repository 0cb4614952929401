//! CSV implementation of the persistence sink

use crate::model::{BusinessRecord, Category, Region};
use crate::storage::paths::ArtifactPaths;
use crate::storage::traits::{PersistenceSink, StorageError, StorageResult};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Header of the URL and failed-URL artifacts
pub const URL_HEADER: &[&str] = &["Url"];

/// Header of the record artifact
pub const RECORD_HEADER: &[&str] = &[
    "Username",
    "Email",
    "Phone Number",
    "Password",
    "Address",
    "Latitude",
    "Longitude",
    "Provider Type",
    "Provider Name",
    "State",
    "City",
];

/// Written in place of a field the listing page did not provide
pub const NOT_AVAILABLE: &str = "N/A";

/// Persists artifacts as CSV files in per-state folders
///
/// Files are opened per write and closed again, so every row is on disk when
/// the call returns. A single lock serializes writers across all artifacts.
pub struct CsvSink {
    output_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvSink {
    /// Creates a sink rooted at `output_dir`; nothing is touched until the first write
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Artifact locations for an identity
    pub fn paths(&self, region: &Region, category: &Category) -> ArtifactPaths {
        ArtifactPaths::resolve(&self.output_dir, region, category)
    }

    /// Appends rows, writing `header` first if the file is new
    fn append_rows<I, R>(&self, path: &Path, header: &[&str], rows: I) -> StorageResult<()>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator,
        R::Item: AsRef<[u8]>,
    {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let is_new = !path.exists();

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);

        if is_new {
            writer.write_record(header)?;
        }
        for row in rows {
            writer.write_record(row)?;
            writer.flush()?;
        }
        writer.flush()?;

        Ok(())
    }
}

impl PersistenceSink for CsvSink {
    fn append_urls(&self, urls: &[String], region: &Region, category: &Category) -> StorageResult<PathBuf> {
        let path = self.paths(region, category).urls;
        self.append_rows(&path, URL_HEADER, urls.iter().map(|url| [url.as_str()]))?;
        tracing::debug!("Appended {} URLs to {}", urls.len(), path.display());
        Ok(path)
    }

    fn append_record(&self, record: &BusinessRecord) -> StorageResult<()> {
        let path = self.paths(&record.region, &record.category).records;
        self.append_rows(&path, RECORD_HEADER, [record_row(record)])
    }

    fn write_failed(&self, urls: &[String], region: &Region, category: &Category) -> StorageResult<PathBuf> {
        let path = self.paths(region, category).failed;
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(File::create(&path)?);
        writer.write_record(URL_HEADER)?;
        for url in urls {
            writer.write_record([url.as_str()])?;
        }
        writer.flush()?;

        Ok(path)
    }

    fn read_urls(&self, region: &Region, category: &Category) -> StorageResult<Option<Vec<String>>> {
        let path = self.paths(region, category).urls;
        if !path.exists() {
            return Ok(None);
        }
        read_url_column(&path).map(Some)
    }
}

/// Reads the `Url` column of a CSV file, or its first column if none is named so
pub fn read_url_column(path: &Path) -> StorageResult<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(StorageError::MissingHeader {
            path: path.to_path_buf(),
        });
    }
    let column = headers.iter().position(|name| name == "Url").unwrap_or(0);

    let mut urls = Vec::new();
    for row in reader.records() {
        let row = row?;
        if let Some(url) = row.get(column).map(str::trim).filter(|url| !url.is_empty()) {
            urls.push(url.to_string());
        }
    }

    Ok(urls)
}

/// Counts data rows (excluding the header) of a CSV file
pub fn count_rows(path: &Path) -> StorageResult<usize> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let mut count = 0;
    for row in reader.records() {
        row?;
        count += 1;
    }
    Ok(count)
}

fn record_row(record: &BusinessRecord) -> [&str; 11] {
    fn or_marker(value: &Option<String>) -> &str {
        value.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    // The downstream schema repeats the name as both username and provider name.
    // Provider Type is the category the files are named after, not the provider key.
    [
        record.name.as_str(),
        record.derived_email.as_str(),
        or_marker(&record.phone),
        record.derived_password.as_str(),
        or_marker(&record.address),
        or_marker(&record.latitude),
        or_marker(&record.longitude),
        record.category.as_str(),
        record.name.as_str(),
        record.region.state_code.as_str(),
        record.region.city.as_str(),
    ]
}
