//! Page fetching and response classification
//!
//! This module issues one GET through a session and classifies the answer:
//! - A body carrying a bot-challenge marker is a challenge, whatever the status
//! - 403 and 429 are blocks
//! - Any other status >= 400 is an HTTP error
//! - Transport failures are network errors (timeout, connect, other)

use crate::crawler::session::Session;
use reqwest::StatusCode;
use std::fmt;
use url::Url;

/// Transport failure categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    Timeout,
    Connect,
    Other,
}

impl fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => f.write_str("timeout"),
            Self::Connect => f.write_str("connect"),
            Self::Other => f.write_str("transport"),
        }
    }
}

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchOutcome {
    /// Usable page content
    Page {
        /// HTTP status code
        status: u16,
        /// Final URL after redirects
        final_url: String,
        body: String,
    },

    /// An anti-automation verification page instead of content
    Challenge { status: u16, body: String },

    /// 403 or 429 without a challenge marker
    Blocked { status: u16, body: String },

    /// Any other HTTP error status
    HttpError { status: u16 },

    /// Connection failure, timeout, or a body that could not be read
    NetworkError {
        kind: NetworkErrorKind,
        message: String,
    },
}

impl FetchOutcome {
    /// Returns true for challenge and block answers
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Challenge { .. } | Self::Blocked { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Page { status, .. }
            | Self::Challenge { status, .. }
            | Self::Blocked { status, .. }
            | Self::HttpError { status } => Some(*status),
            Self::NetworkError { .. } => None,
        }
    }

    /// Short description for logs and progress events
    pub fn describe(&self) -> String {
        match self {
            Self::Page { status, .. } => format!("HTTP {}", status),
            Self::Challenge { status, .. } => format!("bot challenge (HTTP {})", status),
            Self::Blocked { status, .. } => format!("blocked (HTTP {})", status),
            Self::HttpError { status } => format!("HTTP {}", status),
            Self::NetworkError { kind, message } => format!("{} error: {}", kind, message),
        }
    }
}

/// Fetches a URL and classifies the response
///
/// # Arguments
///
/// * `session` - The session to send the request through
/// * `url` - The URL to fetch
/// * `referer` - Referring page, honoured in plain mode only
/// * `challenge_markers` - Lower-case texts that identify a challenge page
pub async fn fetch_page(
    session: &Session,
    url: &Url,
    referer: Option<&Url>,
    challenge_markers: &[String],
) -> FetchOutcome {
    tracing::debug!("Fetching {}", url);

    let response = match session.get(url, referer).send().await {
        Ok(response) => response,
        Err(e) => return network_error(&e),
    };

    let status = response.status();
    let final_url = response.url().to_string();

    match response.text().await {
        Ok(body) => classify_response(status, final_url, body, challenge_markers),
        Err(e) => network_error(&e),
    }
}

/// Classifies a received response
///
/// A challenge marker anywhere in the body wins over the status code.
pub fn classify_response(
    status: StatusCode,
    final_url: String,
    body: String,
    challenge_markers: &[String],
) -> FetchOutcome {
    let code = status.as_u16();

    if contains_challenge_marker(&body, challenge_markers) {
        return FetchOutcome::Challenge { status: code, body };
    }

    if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
        return FetchOutcome::Blocked { status: code, body };
    }

    if code >= 400 {
        return FetchOutcome::HttpError { status: code };
    }

    FetchOutcome::Page {
        status: code,
        final_url,
        body,
    }
}

/// Case-insensitive search for any marker in the body
pub fn contains_challenge_marker(body: &str, markers: &[String]) -> bool {
    if markers.is_empty() {
        return false;
    }
    let lowered = body.to_lowercase();
    markers
        .iter()
        .any(|marker| !marker.is_empty() && lowered.contains(&marker.to_lowercase()))
}

fn network_error(error: &reqwest::Error) -> FetchOutcome {
    let kind = if error.is_timeout() {
        NetworkErrorKind::Timeout
    } else if error.is_connect() {
        NetworkErrorKind::Connect
    } else {
        NetworkErrorKind::Other
    };

    FetchOutcome::NetworkError {
        kind,
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> Vec<String> {
        vec!["challenge-platform".to_string(), "just a moment".to_string()]
    }

    fn classify(status: u16, body: &str) -> FetchOutcome {
        classify_response(
            StatusCode::from_u16(status).unwrap(),
            "https://x.test/".to_string(),
            body.to_string(),
            &markers(),
        )
    }

    #[test]
    fn test_ok_page() {
        let outcome = classify(200, "<html>results</html>");
        assert!(matches!(outcome, FetchOutcome::Page { status: 200, .. }));
        assert!(!outcome.is_blocking());
    }

    #[test]
    fn test_challenge_marker_beats_status() {
        assert!(matches!(
            classify(200, "<title>Just a Moment...</title>"),
            FetchOutcome::Challenge { status: 200, .. }
        ));
        assert!(matches!(
            classify(403, r#"<script src="/cdn-cgi/challenge-platform/x.js">"#),
            FetchOutcome::Challenge { status: 403, .. }
        ));
    }

    #[test]
    fn test_blocked_statuses() {
        assert!(matches!(classify(403, "denied"), FetchOutcome::Blocked { status: 403, .. }));
        assert!(matches!(classify(429, "slow down"), FetchOutcome::Blocked { status: 429, .. }));
        assert!(classify(429, "").is_blocking());
    }

    #[test]
    fn test_other_errors() {
        assert!(matches!(classify(404, ""), FetchOutcome::HttpError { status: 404 }));
        assert!(matches!(classify(503, ""), FetchOutcome::HttpError { status: 503 }));
    }

    #[test]
    fn test_no_markers_configured() {
        assert!(!contains_challenge_marker("just a moment", &[]));
        assert!(!contains_challenge_marker("anything", &[String::new()]));
    }

    #[test]
    fn test_describe() {
        assert_eq!(classify(403, "").describe(), "blocked (HTTP 403)");
        let network = FetchOutcome::NetworkError {
            kind: NetworkErrorKind::Timeout,
            message: "deadline".to_string(),
        };
        assert_eq!(network.describe(), "timeout error: deadline");
        assert_eq!(network.status(), None);
    }
}
