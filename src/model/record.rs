use crate::model::{Category, Region};
use crate::parser::ListingDetails;

/// Domain appended to the token-concatenated name
const DERIVED_EMAIL_DOMAIN: &str = "@gmail.com";

/// Suffix appended to the first name token
const DERIVED_PASSWORD_SUFFIX: &str = "@123";

/// One business listing, as persisted to the record file
///
/// `derived_email` and `derived_password` are synthesized from the name to fill
/// a fixed downstream schema. They are placeholders, not scraped facts and not
/// credentials, and nothing guarantees their uniqueness.
#[derive(Debug, Clone, PartialEq)]
pub struct BusinessRecord {
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub derived_email: String,
    pub derived_password: String,
    pub category: Category,
    pub region: Region,
    /// The listing page this record came from
    pub source_url: String,
}

impl BusinessRecord {
    /// Builds a record from parsed listing details
    pub fn new(details: ListingDetails, category: Category, region: Region, source_url: &str) -> Self {
        let derived_email = derive_email(&details.name);
        let derived_password = derive_password(&details.name);

        Self {
            name: details.name,
            phone: details.phone,
            address: details.address,
            latitude: details.latitude,
            longitude: details.longitude,
            derived_email,
            derived_password,
            category,
            region,
            source_url: source_url.to_string(),
        }
    }
}

/// All whitespace-separated name tokens concatenated, plus the fixed domain
///
/// A name without tokens (never produced by the extractor) yields
/// `default@gmail.com`.
pub fn derive_email(name: &str) -> String {
    let joined: String = name.split_whitespace().collect();
    if joined.is_empty() {
        format!("default{}", DERIVED_EMAIL_DOMAIN)
    } else {
        format!("{}{}", joined, DERIVED_EMAIL_DOMAIN)
    }
}

/// The first name token plus the fixed suffix
pub fn derive_password(name: &str) -> String {
    let first = name.split_whitespace().next().unwrap_or("default");
    format!("{}{}", first, DERIVED_PASSWORD_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    // The derived columns are placeholders built from the business name:
    // every whitespace token concatenated plus "@gmail.com" for the email,
    // the first token plus "@123" for the password.

    #[test]
    fn test_derived_fields_from_two_token_name() {
        assert_eq!(derive_email("Ann Lee"), "AnnLee@gmail.com");
        assert_eq!(derive_password("Ann Lee"), "Ann@123");
    }

    #[test]
    fn test_derived_fields_keep_punctuation_and_case() {
        assert_eq!(
            derive_email("Smile Dental & Co."),
            "SmileDental&Co.@gmail.com"
        );
        assert_eq!(derive_password("Smile Dental & Co."), "Smile@123");
    }

    #[test]
    fn test_derived_fields_collapse_irregular_whitespace() {
        assert_eq!(derive_email("  Ann \t Lee\n"), "AnnLee@gmail.com");
        assert_eq!(derive_password("  Ann \t Lee\n"), "Ann@123");
    }

    #[test]
    fn test_derived_fields_single_token() {
        assert_eq!(derive_email("Acme"), "Acme@gmail.com");
        assert_eq!(derive_password("Acme"), "Acme@123");
    }

    #[test]
    fn test_derived_fields_empty_name() {
        assert_eq!(derive_email(""), "default@gmail.com");
        assert_eq!(derive_password(" "), "default@123");
    }

    #[test]
    fn test_record_from_details() {
        let details = ListingDetails {
            name: "Ann Lee".to_string(),
            phone: Some("(360) 555-0100".to_string()),
            address: None,
            latitude: Some("47.0".to_string()),
            longitude: Some("-122.0".to_string()),
        };
        let region = Region::new("WA", "Aberdeen").unwrap();
        let category = Category::from_search_term("dental care");

        let record = BusinessRecord::new(details, category, region, "https://x.test/mip/1");

        assert_eq!(record.name, "Ann Lee");
        assert_eq!(record.derived_email, "AnnLee@gmail.com");
        assert_eq!(record.derived_password, "Ann@123");
        assert_eq!(record.category.as_str(), "dental_care");
        assert_eq!(record.source_url, "https://x.test/mip/1");
        assert!(record.address.is_none());
    }
}
