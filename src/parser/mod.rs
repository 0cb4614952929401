//! HTML parsing for result pages and listing pages
//!
//! # Components
//!
//! - `chain`: ordered fallback rule tables and the walker shared by every
//!   extraction step
//! - `listing`: result cards, listing links and the next-page decision
//! - `detail`: business name, phone and address from a listing page
//! - `geo`: coordinates from embedded JSON-LD

mod chain;
mod detail;
mod geo;
mod listing;

pub use chain::{element_text, first_match, Resolved, Rule};
pub use detail::{extract_details, ADDRESS_RULES, NAME_RULES, PHONE_RULES};
pub use geo::{coordinates_from_json, find_coordinates, Coordinates};
pub use listing::{
    card_listing_link, find_result_cards, has_next_page, parse_result_page, CardStrategy,
    LinkStrategy, NextPageStrategy, ResultPage, CARD_RULES, LINK_RULES, NEXT_PAGE_RULES,
};

use thiserror::Error;

/// Fields scraped from one listing page
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListingDetails {
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

/// A listing page that cannot become a record
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionFailure {
    /// None of the name rules matched
    #[error("no business name found on {url}")]
    MissingIdentity { url: String },
}
