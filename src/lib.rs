//! Listing-Harvest: a business-directory harvester
//!
//! This crate discovers listing URLs on a business-directory site for a search
//! term and location, then visits each listing to extract contact records,
//! persisting everything incrementally to per-region CSV files.

pub mod config;
pub mod crawler;
pub mod model;
pub mod output;
pub mod parser;
pub mod state;
pub mod storage;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Listing-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    #[error("Unknown provider type: {0}")]
    UnknownProvider(String),

    #[error("URL file not found: {}", path.display())]
    UrlFileMissing { path: PathBuf },

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::DiscoveryState,
        to: state::DiscoveryState,
    },

    #[error("Extraction worker failed: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Listing-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{discover_urls, extract_records};
pub use model::{BusinessRecord, Category, CrawlRequest, Region};
pub use output::{DiscoveryReport, ExtractionReport, ProgressEvent, ProgressReporter};
