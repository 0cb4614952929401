//! Data model shared by discovery, extraction and persistence
//!
//! - `CrawlRequest`: immutable input of a discovery run
//! - `Region` / `Category`: the identity output files are keyed by
//! - `BusinessRecord`: one extracted listing

mod record;
mod region;

pub use record::{derive_email, derive_password, BusinessRecord};
pub use region::{is_state_folder, resolve_state_code, Region};

use std::collections::BTreeMap;
use std::fmt;

use crate::HarvestError;

/// Lower-cases a name and replaces spaces with underscores
///
/// This is the normalization every output file name goes through.
pub fn normalize_segment(value: &str) -> String {
    value.trim().replace(' ', "_").to_lowercase()
}

/// The provider category a run is filed under
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Category(String);

impl Category {
    /// Derives the category identity from a search term
    ///
    /// ```
    /// use listing_harvest::Category;
    ///
    /// assert_eq!(Category::from_search_term("Dental Care").as_str(), "dental_care");
    /// ```
    pub fn from_search_term(term: &str) -> Self {
        Self(normalize_segment(term))
    }

    /// Resolves a configured provider key to its search term and category
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::UnknownProvider` if the key is not configured.
    pub fn from_provider(
        key: &str,
        providers: &BTreeMap<String, String>,
    ) -> Result<(String, Self), HarvestError> {
        let term = providers
            .get(key)
            .ok_or_else(|| HarvestError::UnknownProvider(key.to_string()))?;
        Ok((term.clone(), Self::from_search_term(term)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Input of one discovery run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    pub search_term: String,
    pub region: Region,
}

impl CrawlRequest {
    pub fn new(search_term: &str, region: Region) -> Self {
        Self {
            search_term: search_term.trim().to_string(),
            region,
        }
    }

    /// The category this request's output is filed under
    pub fn category(&self) -> Category {
        Category::from_search_term(&self.search_term)
    }
}
