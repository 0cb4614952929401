//! URL handling module for Listing-Harvest
//!
//! This module builds search-result URLs and turns listing hrefs found on
//! result pages into absolute, de-duplicable listing URLs.

mod normalize;

pub use normalize::{normalize_listing_url, resolve_listing_href};

use crate::config::SiteConfig;
use crate::model::CrawlRequest;
use url::Url;

/// Builds the search URL for one result page
///
/// The `page` parameter is only added from page 2 on; page 1 is the bare
/// search.
///
/// # Examples
///
/// ```
/// use listing_harvest::config::SiteConfig;
/// use listing_harvest::model::{CrawlRequest, Region};
/// use listing_harvest::url::search_url;
///
/// let request = CrawlRequest::new("dental care", Region::new("WA", "Aberdeen").unwrap());
/// let url = search_url(&SiteConfig::default(), &request, 2).unwrap();
/// assert_eq!(
///     url.as_str(),
///     "https://www.yellowpages.com/search?search_terms=dental+care&geo_location_terms=Aberdeen%2C+WA&page=2"
/// );
/// ```
pub fn search_url(
    site: &SiteConfig,
    request: &CrawlRequest,
    page: u32,
) -> Result<Url, url::ParseError> {
    let mut url = site_base(site)?.join(&site.search_path)?;

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("search_terms", &request.search_term);
        query.append_pair("geo_location_terms", &request.region.geo_location_terms());
        if page > 1 {
            query.append_pair("page", &page.to_string());
        }
    }

    Ok(url)
}

/// The site origin that relative listing links resolve against
pub fn site_base(site: &SiteConfig) -> Result<Url, url::ParseError> {
    Url::parse(&site.base_url)
}
