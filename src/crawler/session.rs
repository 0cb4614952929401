//! HTTP session construction
//!
//! A session is one configured `reqwest::Client` plus the identity mode it was
//! built in. Sessions are built per run and never shared across runs.

use crate::config::SessionConfig;
use crate::crawler::pacing::{Pacer, PauseKind};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Proxy, RequestBuilder, StatusCode};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7";

/// Browser-identity headers sent with every plain-mode request
///
/// `Accept-Encoding` is left to the client, which advertises exactly the
/// decoders it was built with.
const PLAIN_HEADERS: &[(&str, &str)] = &[
    ("accept", ACCEPT),
    ("connection", "keep-alive"),
    ("upgrade-insecure-requests", "1"),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "none"),
    ("sec-fetch-user", "?1"),
    ("cache-control", "max-age=0"),
    ("dnt", "1"),
];

/// Client-hint profile of desktop Chrome on Windows
#[cfg(feature = "challenge-bypass")]
const CLIENT_HINT_HEADERS: &[(&str, &str)] = &[
    ("accept", ACCEPT),
    ("sec-ch-ua", r#""Google Chrome";v="131", "Chromium";v="131", "Not_A Brand";v="24""#),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", r#""Windows""#),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "none"),
    ("sec-fetch-user", "?1"),
    ("upgrade-insecure-requests", "1"),
];

/// How a session presents itself to the site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Static browser headers with a per-request `Referer`
    Plain,

    /// Chrome client-hint headers, a cookie jar and a longer timeout
    ///
    /// This only changes how requests look. It does not run JavaScript or
    /// solve challenge pages; a challenge still comes back as a challenge.
    #[cfg(feature = "challenge-bypass")]
    ChallengeAware,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            #[cfg(feature = "challenge-bypass")]
            Self::ChallengeAware => "challenge-aware",
        }
    }
}

/// A configured HTTP client for one run
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
    mode: SessionMode,
    timeout: Duration,
}

impl Session {
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn is_plain(&self) -> bool {
        self.mode == SessionMode::Plain
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Starts a GET request
    ///
    /// `referer` is only sent in plain mode; the challenge-aware identity
    /// manages its own headers.
    pub fn get(&self, url: &Url, referer: Option<&Url>) -> RequestBuilder {
        let request = self.client.get(url.clone());
        match referer {
            Some(referer) if self.is_plain() => request.header(header::REFERER, referer.as_str()),
            _ => request,
        }
    }

    /// Visits the homepage to pick up cookies, then pauses
    ///
    /// A 403 in plain mode triggers one extra visit to `/about`. Nothing here
    /// fails the run; problems are logged and the crawl continues.
    pub async fn warm_up(&self, homepage: &Url, pacer: &Pacer, cancel: &CancellationToken) {
        tracing::info!("Establishing session via {}", homepage);

        match self.get(homepage, None).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!("Homepage answered {}", response.status());
            }
            Ok(response) if response.status() == StatusCode::FORBIDDEN => {
                tracing::warn!("Homepage answered 403 ({} session)", self.mode.as_str());
                if self.is_plain() {
                    if let Ok(about) = homepage.join("/about") {
                        if let Err(e) = self.get(&about, None).send().await {
                            tracing::warn!("Fallback visit to {} failed: {}", about, e);
                        }
                    }
                }
            }
            Ok(response) => {
                tracing::warn!("Homepage answered {}", response.status());
            }
            Err(e) => {
                tracing::warn!("Could not load homepage, continuing anyway: {}", e);
            }
        }

        pacer.pause(PauseKind::WarmUp, cancel).await;
    }
}

/// Builds the session for one run
///
/// Never fails: an unusable header value falls back to a safe default, a bad
/// proxy is dropped with a warning, and requesting challenge bypass in a build
/// without it degrades to the plain session.
///
/// # Arguments
///
/// * `config` - The session configuration
/// * `use_challenge_bypass` - Whether to build the challenge-aware identity
pub fn build_session(config: &SessionConfig, use_challenge_bypass: bool) -> Session {
    let mode = resolve_mode(use_challenge_bypass);

    let (headers, timeout) = match mode {
        SessionMode::Plain => (
            identity_headers(config, PLAIN_HEADERS),
            Duration::from_secs(config.plain_timeout_secs),
        ),
        #[cfg(feature = "challenge-bypass")]
        SessionMode::ChallengeAware => (
            identity_headers(config, CLIENT_HINT_HEADERS),
            Duration::from_secs(config.bypass_timeout_secs),
        ),
    };

    let mut builder = Client::builder()
        .default_headers(headers)
        .cookie_store(true)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = config.proxy.as_deref() {
        match Proxy::all(proxy) {
            Ok(proxy) => builder = builder.proxy(proxy),
            Err(e) => tracing::warn!("Ignoring unusable proxy {}: {}", proxy, e),
        }
    }

    let client = builder.build().unwrap_or_else(|e| {
        tracing::warn!("Falling back to a default HTTP client: {}", e);
        Client::new()
    });

    tracing::debug!("Built {} session (timeout {:?})", mode.as_str(), timeout);

    Session {
        client,
        mode,
        timeout,
    }
}

#[cfg(feature = "challenge-bypass")]
fn resolve_mode(use_challenge_bypass: bool) -> SessionMode {
    if use_challenge_bypass {
        SessionMode::ChallengeAware
    } else {
        SessionMode::Plain
    }
}

#[cfg(not(feature = "challenge-bypass"))]
fn resolve_mode(use_challenge_bypass: bool) -> SessionMode {
    if use_challenge_bypass {
        tracing::warn!(
            "Challenge bypass is not available in this build; continuing with the plain session"
        );
    }
    SessionMode::Plain
}

fn identity_headers(config: &SessionConfig, fixed: &[(&'static str, &'static str)]) -> HeaderMap {
    let mut headers = HeaderMap::new();

    for &(name, value) in fixed {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }

    headers.insert(
        header::USER_AGENT,
        header_or_default(&config.user_agent, &SessionConfig::default().user_agent),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        header_or_default(&config.accept_language, &SessionConfig::default().accept_language),
    );

    headers
}

fn header_or_default(value: &str, default: &str) -> HeaderValue {
    HeaderValue::from_str(value).unwrap_or_else(|_| {
        tracing::warn!("Invalid header value {:?}, using default", value);
        HeaderValue::from_str(default).unwrap_or_else(|_| HeaderValue::from_static(""))
    })
}
