use url::Url;

/// Query parameters that never change which listing a URL points to
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
];

/// Schemes and prefixes an href can carry that never lead to a listing
const IGNORED_HREF_PREFIXES: &[&str] = &["javascript:", "mailto:", "tel:", "data:", "#"];

/// Resolves a listing href found on a result page to an absolute URL
///
/// Relative hrefs are joined to the site origin. Returns None if the link
/// should be excluded:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel: and data: links
/// - anything that is not HTTP(S) after resolution
///
/// # Examples
///
/// ```
/// use listing_harvest::url::resolve_listing_href;
/// use url::Url;
///
/// let base = Url::parse("https://www.yellowpages.com").unwrap();
/// let url = resolve_listing_href("/aberdeen-wa/mip/smile-dental-123", &base).unwrap();
/// assert_eq!(url.as_str(), "https://www.yellowpages.com/aberdeen-wa/mip/smile-dental-123");
/// ```
pub fn resolve_listing_href(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if IGNORED_HREF_PREFIXES
        .iter()
        .any(|prefix| lowered.starts_with(prefix))
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return None;
    }

    Some(normalize_listing_url(absolute))
}

/// Puts a listing URL in the form used for de-duplication
///
/// 1. Remove fragment (everything after #)
/// 2. Remove tracking query parameters, keeping the order of the rest
/// 3. Remove empty query string (trailing ?)
pub fn normalize_listing_url(mut url: Url) -> Url {
    url.set_fragment(None);

    if url.query().is_some() {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.as_ref()))
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
    }

    url
}
