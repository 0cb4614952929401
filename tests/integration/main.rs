//! Integration tests for both harvesting stages
//!
//! These tests use wiremock to stand in for the directory site and run
//! discovery and extraction end-to-end with every pause set to zero.

mod discovery_tests;
mod extraction_tests;

use listing_harvest::config::{
    Config, DelayRange, OutputConfig, PacingConfig, RetryConfig, SessionConfig, SiteConfig,
};
use listing_harvest::Region;
use std::path::Path;

/// Creates a test configuration pointed at a mock server
pub fn create_test_config(base_url: &str, output_dir: &Path) -> Config {
    Config {
        site: SiteConfig {
            base_url: base_url.to_string(),
            ..SiteConfig::default()
        },
        session: SessionConfig {
            warm_up: false,
            plain_timeout_secs: 5,
            ..SessionConfig::default()
        },
        pacing: PacingConfig::immediate(),
        retry: RetryConfig {
            max_attempts: 3,
            backoff: DelayRange::zero(),
            blocked_backoff: DelayRange::zero(),
        },
        output: OutputConfig {
            directory: output_dir.to_string_lossy().into_owned(),
            debug_dir: None,
        },
        ..Config::with_default_providers()
    }
}

pub fn aberdeen() -> Region {
    Region::new("WA", "Aberdeen").expect("valid region")
}

/// A search results page with one card per path and an optional next link
pub fn result_page(paths: &[String], has_next: bool) -> String {
    let cards: String = paths
        .iter()
        .map(|path| {
            format!(
                r#"<div class="result"><h2><a class="business-name" href="{}">Listing</a></h2></div>"#,
                path
            )
        })
        .collect();
    let next = if has_next {
        r#"<div class="pagination"><a class="next" href="?page=next">Next</a></div>"#
    } else {
        ""
    };

    format!(
        "<html><head><title>Results</title></head><body>{}{}</body></html>",
        cards, next
    )
}

/// A listing page with every field present
pub fn listing_page(name: &str) -> String {
    format!(
        r#"<html><head>
        <script type="application/ld+json">{{"@type": "Dentist", "geo": {{"latitude": 46.97, "longitude": -123.81}}}}</script>
        </head><body>
        <h1 class="business-name">{}</h1>
        <div id="default-ctas">
            <div class="phone">(360) 555-0100</div>
            <div class="address">101 Main St, Aberdeen, WA 98520</div>
        </div>
        </body></html>"#,
        name
    )
}
