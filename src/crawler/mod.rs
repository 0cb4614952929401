//! Crawler module for both harvesting stages
//!
//! This module contains the network-facing logic, including:
//! - Session construction (plain or challenge-aware identity)
//! - Page fetching and response classification
//! - Randomized pacing and bounded retries
//! - Pagination discovery and concurrent detail extraction

mod discovery;
mod extraction;
mod fetcher;
mod pacing;
mod retry;
mod session;

pub use discovery::{DiscoveryOutcome, PaginationCrawler};
pub use extraction::{run_extraction, ExtractionContext, ExtractionOutcome};
pub use fetcher::{classify_response, fetch_page, FetchOutcome, NetworkErrorKind};
pub use pacing::{Pacer, PauseKind};
pub use retry::{AttemptError, RetryOutcome, RetryPolicy};
pub use session::{build_session, Session, SessionMode};

use crate::config::Config;
use crate::model::{Category, CrawlRequest, Region};
use crate::output::{DiscoveryReport, ExtractionReport, ProgressReporter};
use crate::storage::{open_sink, PersistenceSink};
use crate::url::site_base;
use crate::{HarvestError, Result};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Discovers listing URLs for one search and appends them to the URL file
///
/// This is the entry point of the first stage. It will:
/// 1. Build the session and optionally warm it up via the homepage
/// 2. Walk result pages until a stop condition is met
/// 3. Append the unique URLs to `<STATE>/<state>_<city>_<category>_urls.csv`
///
/// An empty result leaves the file system untouched.
///
/// # Arguments
///
/// * `config` - The harvester configuration
/// * `request` - Search term and region
/// * `use_challenge_bypass` - Whether to use the challenge-aware identity
/// * `progress` - Receives progress events
/// * `cancel` - Stops the run at the next page boundary or pause
///
/// # Returns
///
/// * `Ok(DiscoveryReport)` - How many URLs were found and why the run stopped
/// * `Err(HarvestError)` - The URL file could not be written
pub async fn discover_urls(
    config: &Config,
    request: &CrawlRequest,
    use_challenge_bypass: bool,
    progress: &ProgressReporter,
    cancel: &CancellationToken,
) -> Result<DiscoveryReport> {
    let homepage = site_base(&config.site)?;
    let session = build_session(&config.session, use_challenge_bypass);

    if config.session.warm_up {
        let pacer = Pacer::new(config.pacing.clone());
        session.warm_up(&homepage, &pacer, cancel).await;
    }

    let outcome = PaginationCrawler::new(config, &session, progress, cancel)?
        .run(request)
        .await?;

    let sink = open_sink(Path::new(&config.output.directory));
    let category = request.category();
    let path = sink.paths(&request.region, &category).urls;

    let persisted = !outcome.urls.is_empty();
    if persisted {
        sink.append_urls(&outcome.urls, &request.region, &category)?;
        tracing::info!("Saved {} URLs to {}", outcome.urls.len(), path.display());
    } else {
        tracing::warn!("No URLs found for '{}' in {}", request.search_term, request.region);
    }

    Ok(DiscoveryReport {
        path,
        url_count: outcome.urls.len(),
        pages_visited: outcome.pages_visited,
        stop_reason: outcome.stop_reason,
        persisted,
    })
}

/// Extracts a record for every URL in the URL file of `region` / `category`
///
/// This is the entry point of the second stage. Records are appended as they
/// are extracted; the failed file is rewritten once the run completes.
///
/// # Errors
///
/// Returns `HarvestError::UrlFileMissing` if discovery has not produced a URL
/// file yet, and storage errors from writing records.
pub async fn extract_records(
    config: &Config,
    region: &Region,
    category: &Category,
    use_challenge_bypass: bool,
    progress: &ProgressReporter,
    cancel: &CancellationToken,
) -> Result<ExtractionReport> {
    let sink = open_sink(Path::new(&config.output.directory));
    let paths = sink.paths(region, category);

    let urls = sink
        .read_urls(region, category)?
        .ok_or_else(|| HarvestError::UrlFileMissing {
            path: paths.urls.clone(),
        })?;
    tracing::info!("Loaded {} URLs from {}", urls.len(), paths.urls.display());

    let homepage = site_base(&config.site)?;
    let session = build_session(&config.session, use_challenge_bypass);
    let pacer = Pacer::new(config.pacing.clone());

    if config.session.warm_up {
        session.warm_up(&homepage, &pacer, cancel).await;
    }

    let context = ExtractionContext {
        session,
        pacer,
        policy: RetryPolicy::from(&config.retry),
        challenge_markers: config.site.challenge_markers.clone(),
        homepage,
        category: category.clone(),
        region: region.clone(),
        sink: Arc::new(sink),
        progress: progress.clone(),
    };

    let outcome = run_extraction(context, urls, config.extraction.workers, cancel).await?;

    Ok(ExtractionReport {
        path: paths.records,
        failed_path: paths.failed,
        record_count: outcome.records,
        failed_count: outcome.failed.len(),
        skipped: outcome.skipped,
        cancelled: cancel.is_cancelled(),
    })
}
