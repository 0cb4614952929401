use crate::model::{Category, Region};
use std::path::{Path, PathBuf};

/// Deterministic locations of every artifact for one (region, category)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Upper-case state folder under the output directory
    pub folder: PathBuf,
    pub urls: PathBuf,
    pub records: PathBuf,
    pub failed: PathBuf,
}

impl ArtifactPaths {
    /// Resolves the artifact paths under `output_dir`
    ///
    /// # Example
    ///
    /// ```
    /// use listing_harvest::model::{Category, Region};
    /// use listing_harvest::storage::ArtifactPaths;
    /// use std::path::Path;
    ///
    /// let region = Region::new("wa", "Grays Harbor").unwrap();
    /// let category = Category::from_search_term("Dental Care");
    /// let paths = ArtifactPaths::resolve(Path::new("out"), &region, &category);
    ///
    /// assert_eq!(paths.urls, Path::new("out/WA/wa_grays_harbor_dental_care_urls.csv"));
    /// assert_eq!(paths.records, Path::new("out/WA/wa_grays_harbor_dental_care.csv"));
    /// assert_eq!(paths.failed, Path::new("out/WA/wa_grays_harbor_dental_care_failed.csv"));
    /// ```
    pub fn resolve(output_dir: &Path, region: &Region, category: &Category) -> Self {
        let folder = output_dir.join(state_folder(region));
        let stem = file_stem(region, category);

        Self {
            urls: folder.join(format!("{}_urls.csv", stem)),
            records: folder.join(format!("{}.csv", stem)),
            failed: folder.join(format!("{}_failed.csv", stem)),
            folder,
        }
    }
}

/// Folder name for a region: the upper-case state code
pub fn state_folder(region: &Region) -> String {
    region.state_code.to_uppercase()
}

/// `{state}_{city}_{category}`, lower-cased with spaces turned into underscores
pub fn file_stem(region: &Region, category: &Category) -> String {
    format!("{}_{}_{}", region.state_code, region.city, category.as_str())
        .replace(' ', "_")
        .to_lowercase()
}
