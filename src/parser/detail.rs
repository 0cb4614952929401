//! Listing detail page parsing

use crate::parser::chain::{first_match, select_first, select_text, Rule};
use crate::parser::geo::find_coordinates;
use crate::parser::{ExtractionFailure, ListingDetails};
use scraper::{ElementRef, Html};

pub const NAME_RULES: &[Rule<&str>] = &[
    Rule { name: "div.sales-info", strategy: "div.sales-info" },
    Rule { name: "h1.business-name", strategy: "h1.business-name" },
    Rule { name: "h1", strategy: "h1" },
];

pub const PHONE_RULES: &[Rule<&str>] = &[
    Rule { name: "div.phone", strategy: "div.phone" },
    Rule { name: "a.phone", strategy: "a.phone" },
];

pub const ADDRESS_RULES: &[Rule<&str>] = &[
    Rule { name: "div.address", strategy: "div.address" },
    Rule { name: "span.address", strategy: "span.address" },
];

/// Container holding the call-to-action block with phone and address
const CTA_CONTAINER: &str = "div#default-ctas";

/// Extracts business details from a listing page
///
/// Only the name is mandatory. Phone and address are looked up inside the
/// call-to-action block first and then anywhere on the page; coordinates come
/// from JSON-LD.
///
/// # Arguments
///
/// * `html` - The listing page body
/// * `source_url` - The listing URL, used in the failure value
///
/// # Returns
///
/// * `Ok(ListingDetails)` - A name was found
/// * `Err(ExtractionFailure::MissingIdentity)` - No name rule matched
pub fn extract_details(html: &str, source_url: &str) -> Result<ListingDetails, ExtractionFailure> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let name = text_by_rules(root, NAME_RULES).ok_or_else(|| ExtractionFailure::MissingIdentity {
        url: source_url.to_string(),
    })?;

    let cta = select_first(root, CTA_CONTAINER);
    let phone = scoped_text(cta, root, PHONE_RULES);
    let address = scoped_text(cta, root, ADDRESS_RULES);
    let coordinates = find_coordinates(&document).unwrap_or_default();

    Ok(ListingDetails {
        name,
        phone,
        address,
        latitude: coordinates.latitude,
        longitude: coordinates.longitude,
    })
}

fn text_by_rules(scope: ElementRef<'_>, rules: &[Rule<&str>]) -> Option<String> {
    first_match(rules, |css| select_text(scope, css)).map(|resolved| resolved.value)
}

/// Tries the preferred container first, then the whole page
fn scoped_text(preferred: Option<ElementRef<'_>>, page: ElementRef<'_>, rules: &[Rule<&str>]) -> Option<String> {
    preferred
        .and_then(|scope| text_by_rules(scope, rules))
        .or_else(|| text_by_rules(page, rules))
}
