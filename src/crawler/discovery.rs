//! Pagination crawler - walks search-result pages and collects listing URLs
//!
//! Pages are visited strictly in order. Each page moves through the
//! `DiscoveryState` machine; every step is checked against the legal
//! transitions so a logic slip surfaces as an error instead of a silent loop.
//!
//! The run stops when:
//! - the last page shows no enabled "next" control
//! - `failure-threshold` consecutive pages were unproductive
//! - the `max-pages` ceiling is reached
//! - the cancellation token fires

use crate::config::{Config, DiscoveryConfig, SiteConfig};
use crate::crawler::fetcher::{fetch_page, FetchOutcome};
use crate::crawler::pacing::{Pacer, PauseKind};
use crate::crawler::session::Session;
use crate::model::CrawlRequest;
use crate::output::{ProgressEvent, ProgressReporter};
use crate::parser::parse_result_page;
use crate::state::{DiscoveryState, FailureBudget, StopReason};
use crate::url::{search_url, site_base};
use crate::{HarvestError, Result};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use url::Url;

/// What a discovery run produced
#[derive(Debug, Clone)]
pub struct DiscoveryOutcome {
    /// Unique listing URLs in discovery order
    pub urls: Vec<String>,
    pub stop_reason: StopReason,
    pub pages_visited: u32,
}

/// Drives one discovery run
pub struct PaginationCrawler<'a> {
    site: &'a SiteConfig,
    limits: &'a DiscoveryConfig,
    debug_dir: Option<PathBuf>,
    session: &'a Session,
    pacer: Pacer,
    progress: &'a ProgressReporter,
    cancel: &'a CancellationToken,
    homepage: Url,
    state: DiscoveryState,
    budget: FailureBudget,
    seen: HashSet<String>,
    urls: Vec<String>,
    pages_visited: u32,
}

impl<'a> PaginationCrawler<'a> {
    /// Creates a crawler for one run
    ///
    /// # Errors
    ///
    /// Fails only if the configured base URL does not parse.
    pub fn new(
        config: &'a Config,
        session: &'a Session,
        progress: &'a ProgressReporter,
        cancel: &'a CancellationToken,
    ) -> Result<Self> {
        Ok(Self {
            site: &config.site,
            limits: &config.discovery,
            debug_dir: config.output.debug_dir.as_ref().map(PathBuf::from),
            session,
            pacer: Pacer::new(config.pacing.clone()),
            progress,
            cancel,
            homepage: site_base(&config.site)?,
            state: DiscoveryState::start(),
            budget: FailureBudget::new(config.discovery.failure_threshold),
            seen: HashSet::new(),
            urls: Vec::new(),
            pages_visited: 0,
        })
    }

    /// Runs discovery to completion
    ///
    /// Page and fetch failures never abort the run; they count against the
    /// failure budget. Only an illegal state transition or an unbuildable
    /// search URL is returned as an error.
    pub async fn run(mut self, request: &CrawlRequest) -> Result<DiscoveryOutcome> {
        tracing::info!(
            "Starting discovery for '{}' in {}",
            request.search_term,
            request.region
        );
        self.progress.emit(ProgressEvent::DiscoveryStarted {
            search_term: request.search_term.clone(),
            region: request.region.to_string(),
        });

        let mut referer = self.homepage.clone();
        let mut page = 1;

        let stop_reason = loop {
            if self.cancel.is_cancelled() {
                break self.finish(StopReason::Cancelled)?;
            }

            let url = search_url(self.site, request, page)?;
            if let Some(reason) = self.crawl_page(page, &url, &referer).await? {
                break reason;
            }

            referer = url;
            page += 1;
        };

        tracing::info!(
            "Discovery finished ({}): {} URLs from {} pages",
            stop_reason,
            self.urls.len(),
            self.pages_visited
        );
        self.progress.emit(ProgressEvent::DiscoveryFinished {
            stop_reason,
            total_urls: self.urls.len(),
        });

        Ok(DiscoveryOutcome {
            urls: self.urls,
            stop_reason,
            pages_visited: self.pages_visited,
        })
    }

    /// Processes one result page and leaves the state at `Fetching(page + 1)` or `Done`
    async fn crawl_page(&mut self, page: u32, url: &Url, referer: &Url) -> Result<Option<StopReason>> {
        tracing::info!("Collecting URLs from page {}", page);
        self.pages_visited += 1;

        let Some(outcome) = self.fetch(page, url, referer).await else {
            return self.finish(StopReason::Cancelled).map(Some);
        };

        let body = match outcome {
            FetchOutcome::Page { body, .. } => body,
            failed => return self.after_failed_fetch(page, failed).await,
        };

        self.advance(DiscoveryState::Parsing { page })?;
        let parsed = parse_result_page(&body, &self.homepage);

        if parsed.card_count == 0 {
            // Card-less pages skip the next-page decision
            tracing::warn!("No result cards found on page {}", page);
            self.capture_debug(format!("debug_page_{}.html", page), &body);
            self.budget.record_failure();
            self.emit_parsed(page, 0, 0);

            if self.budget.is_exhausted() {
                return self.finish(StopReason::FailureThreshold).map(Some);
            }
            return self.next_page(page, PauseKind::AfterEmptyPage).await;
        }

        tracing::debug!(
            "Found {} result cards on page {} using {}",
            parsed.card_count,
            page,
            parsed.card_rule.unwrap_or("?")
        );
        self.advance(DiscoveryState::Extracting { page })?;

        let new_urls = self.collect(parsed.links);
        self.budget.record_yield(new_urls);
        tracing::info!(
            "Collected {} new URLs from page {}. Total: {}",
            new_urls,
            page,
            self.urls.len()
        );
        self.emit_parsed(page, parsed.card_count, new_urls);

        if self.budget.is_exhausted() {
            return self.finish(StopReason::FailureThreshold).map(Some);
        }

        self.advance(DiscoveryState::NextPageDecision { page })?;
        if !parsed.has_next_page {
            tracing::info!("Reached last page - no next control on page {}", page);
            return self.finish(StopReason::NoNextPage).map(Some);
        }

        self.next_page(page, PauseKind::BetweenPages).await
    }

    /// Fetches a page, giving a challenge or block one forced wait and re-fetch
    ///
    /// Returns None if cancelled during the wait.
    async fn fetch(&self, page: u32, url: &Url, referer: &Url) -> Option<FetchOutcome> {
        let markers = &self.site.challenge_markers;

        let outcome = fetch_page(self.session, url, Some(referer), markers).await;
        self.progress.emit(ProgressEvent::PageFetched {
            page,
            status: outcome.status(),
        });

        if !outcome.is_blocking() {
            return Some(outcome);
        }

        tracing::warn!(
            "Page {} answered with {}; waiting before one retry",
            page,
            outcome.describe()
        );
        self.progress.emit(ProgressEvent::ChallengeDetected {
            page,
            status: outcome.status().unwrap_or_default(),
        });

        if !self.pacer.pause(PauseKind::ChallengeWait, self.cancel).await {
            return None;
        }

        let retried = fetch_page(self.session, url, Some(referer), markers).await;
        self.progress.emit(ProgressEvent::PageFetched {
            page,
            status: retried.status(),
        });
        Some(retried)
    }

    async fn after_failed_fetch(&mut self, page: u32, outcome: FetchOutcome) -> Result<Option<StopReason>> {
        if let FetchOutcome::Challenge { body, .. } | FetchOutcome::Blocked { body, .. } = &outcome {
            self.capture_debug(format!("debug_403_page_{}.html", page), body);
        }

        let streak = self.budget.record_failure();
        tracing::warn!(
            "Page {} failed: {} ({} of {} consecutive failures)",
            page,
            outcome.describe(),
            streak,
            self.budget.threshold()
        );

        if self.budget.is_exhausted() {
            return self.finish(StopReason::FailureThreshold).map(Some);
        }

        self.next_page(page, PauseKind::AfterFailure).await
    }

    /// Moves on to `page + 1` unless the ceiling is hit or the pause is cancelled
    async fn next_page(&mut self, page: u32, pause: PauseKind) -> Result<Option<StopReason>> {
        if page >= self.limits.max_pages {
            tracing::info!("Reached the page ceiling ({})", self.limits.max_pages);
            return self.finish(StopReason::PageCeiling).map(Some);
        }

        if !self.pacer.pause(pause, self.cancel).await {
            return self.finish(StopReason::Cancelled).map(Some);
        }

        self.advance(DiscoveryState::Fetching { page: page + 1 })?;
        Ok(None)
    }

    /// Adds unseen links, returning how many were new
    fn collect(&mut self, links: Vec<Url>) -> usize {
        let mut added = 0;
        for link in links {
            let link = link.to_string();
            if self.seen.insert(link.clone()) {
                tracing::debug!("Found URL: {}", link);
                self.urls.push(link);
                added += 1;
            }
        }
        added
    }

    fn emit_parsed(&self, page: u32, cards: usize, new_urls: usize) {
        self.progress.emit(ProgressEvent::PageParsed {
            page,
            cards,
            new_urls,
            total_urls: self.urls.len(),
        });
    }

    fn advance(&mut self, next: DiscoveryState) -> Result<()> {
        if !self.state.can_transition_to(&next) {
            return Err(HarvestError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!("Discovery {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    fn finish(&mut self, reason: StopReason) -> Result<StopReason> {
        self.advance(DiscoveryState::Done(reason))?;
        Ok(reason)
    }

    /// Saves a page body for inspection when a debug directory is configured
    fn capture_debug(&self, file_name: String, body: &str) {
        let Some(dir) = &self.debug_dir else {
            return;
        };
        let path = dir.join(file_name);

        match fs::create_dir_all(dir).and_then(|_| fs::write(&path, body)) {
            Ok(()) => tracing::info!("Saved page HTML to {}", path.display()),
            Err(e) => tracing::warn!("Could not save {}: {}", path.display(), e),
        }
    }
}
