//! Detail extraction - visits each listing URL and persists one record per success
//!
//! URLs are handed to a small pool of workers from a shared queue. Each worker
//! paces itself, retries transient failures through `RetryPolicy` and appends
//! every success immediately, so an interrupted run keeps what it finished.
//! URLs that end without a record are collected and written to the failed
//! file once the pool has drained.

use crate::crawler::fetcher::fetch_page;
use crate::crawler::pacing::{Pacer, PauseKind};
use crate::crawler::retry::{AttemptError, RetryOutcome, RetryPolicy};
use crate::crawler::session::Session;
use crate::model::{BusinessRecord, Category, Region};
use crate::output::{ProgressEvent, ProgressReporter};
use crate::parser::extract_details;
use crate::storage::PersistenceSink;
use crate::{HarvestError, Result};
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

type UrlQueue = Arc<Mutex<VecDeque<(usize, String)>>>;

/// What an extraction run produced
#[derive(Debug, Clone, Default)]
pub struct ExtractionOutcome {
    pub records: usize,

    /// Failed URLs in input order
    pub failed: Vec<String>,

    /// URLs never attempted because the run was cancelled
    pub skipped: usize,

    /// Where the failed list was written; None if the run was cancelled
    pub failed_path: Option<PathBuf>,
}

/// Everything a worker needs, cloned once per worker
#[derive(Clone)]
pub struct ExtractionContext {
    pub session: Session,
    pub pacer: Pacer,
    pub policy: RetryPolicy,
    pub challenge_markers: Vec<String>,
    /// Sent as the referer of every listing request
    pub homepage: Url,
    pub category: Category,
    pub region: Region,
    pub sink: Arc<dyn PersistenceSink>,
    pub progress: ProgressReporter,
}

impl ExtractionContext {
    /// One fetch-and-parse attempt for a listing page
    async fn attempt(&self, url: &Url) -> std::result::Result<BusinessRecord, AttemptError> {
        let outcome = fetch_page(&self.session, url, Some(&self.homepage), &self.challenge_markers).await;
        let body = AttemptError::check(outcome)?;
        let details = extract_details(&body, url.as_str())?;

        Ok(BusinessRecord::new(
            details,
            self.category.clone(),
            self.region.clone(),
            url.as_str(),
        ))
    }
}

/// Extracts records for `urls` with up to `workers` concurrent workers
///
/// Duplicate input URLs are processed once. A storage error while appending a
/// record stops every worker and is returned; fetch and parse failures only
/// land the URL in the failed list.
///
/// # Arguments
///
/// * `context` - Shared session, pacing, retry and output handles
/// * `urls` - Listing URLs in processing order
/// * `workers` - Maximum concurrent workers (at least one is used)
/// * `cancel` - Stops the run between URLs and during pauses
pub async fn run_extraction(
    context: ExtractionContext,
    urls: Vec<String>,
    workers: u32,
    cancel: &CancellationToken,
) -> Result<ExtractionOutcome> {
    let urls = dedupe(urls);
    let total = urls.len();
    context.progress.emit(ProgressEvent::ExtractionStarted { total });
    tracing::info!("Extracting {} listing pages", total);

    let queue: UrlQueue = Arc::new(Mutex::new(urls.into_iter().enumerate().collect()));
    let worker_count = (workers as usize).clamp(1, total.max(1));
    let stop = cancel.child_token();

    let mut pool = JoinSet::new();
    for id in 0..worker_count {
        let worker = Worker {
            id,
            context: context.clone(),
            queue: Arc::clone(&queue),
            cancel: stop.clone(),
            total,
        };
        pool.spawn(worker.run());
    }

    let mut records = 0;
    let mut failed: Vec<(usize, String)> = Vec::new();
    let mut fatal = None;

    while let Some(joined) = pool.join_next().await {
        let result = joined.map_err(|e| HarvestError::Worker(e.to_string()));
        match result.and_then(|report| report) {
            Ok(report) => {
                records += report.records;
                failed.extend(report.failed);
            }
            Err(e) => {
                tracing::error!("Extraction worker stopped: {}", e);
                stop.cancel();
                fatal.get_or_insert(e);
            }
        }
    }

    if let Some(e) = fatal {
        return Err(e);
    }

    failed.sort_by_key(|(index, _)| *index);
    let failed: Vec<String> = failed.into_iter().map(|(_, url)| url).collect();
    let skipped = total.saturating_sub(records + failed.len());

    let failed_path = if cancel.is_cancelled() {
        tracing::warn!("Extraction cancelled; {} URLs left unprocessed", skipped);
        None
    } else {
        let path = context
            .sink
            .write_failed(&failed, &context.region, &context.category)?;
        if !failed.is_empty() {
            tracing::warn!("{} URLs failed; list written to {}", failed.len(), path.display());
        }
        Some(path)
    };

    context.progress.emit(ProgressEvent::ExtractionFinished {
        records,
        failed: failed.len(),
        skipped,
    });

    Ok(ExtractionOutcome {
        records,
        failed,
        skipped,
        failed_path,
    })
}

/// Keeps the first occurrence of every URL
fn dedupe(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

fn next_url(queue: &UrlQueue) -> Option<(usize, String)> {
    queue.lock().unwrap_or_else(PoisonError::into_inner).pop_front()
}

#[derive(Debug, Default)]
struct WorkerReport {
    records: usize,
    failed: Vec<(usize, String)>,
}

struct Worker {
    id: usize,
    context: ExtractionContext,
    queue: UrlQueue,
    cancel: CancellationToken,
    total: usize,
}

impl Worker {
    async fn run(self) -> Result<WorkerReport> {
        let ctx = &self.context;
        let mut report = WorkerReport::default();
        let mut first = true;

        while !self.cancel.is_cancelled() {
            let Some((index, url)) = next_url(&self.queue) else {
                break;
            };

            if !first && !ctx.pacer.pause(PauseKind::BetweenRecords, &self.cancel).await {
                // Not attempted; counted as skipped
                break;
            }
            first = false;

            tracing::info!("[{}/{}] Processing {}", index + 1, self.total, url);
            ctx.progress.emit(ProgressEvent::RecordStarted {
                index: index + 1,
                total: self.total,
                url: url.clone(),
            });

            let parsed = match Url::parse(&url) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!("Skipping unparsable URL {}: {}", url, e);
                    self.fail(&mut report, index, url, 0, e.to_string());
                    continue;
                }
            };

            let url_ref = &parsed;
            let outcome = ctx
                .policy
                .run(
                    &self.cancel,
                    |attempt, delay, error| {
                        tracing::warn!(
                            "Attempt {} for {} failed ({}); retrying in {:.1}s",
                            attempt,
                            url_ref,
                            error,
                            delay.as_secs_f64()
                        );
                        ctx.progress.emit(ProgressEvent::RetryScheduled {
                            url: url_ref.to_string(),
                            attempt,
                            delay,
                            reason: error.to_string(),
                        });
                    },
                    move |_| ctx.attempt(url_ref),
                )
                .await;

            match outcome {
                RetryOutcome::Succeeded { value: record, .. } => {
                    if let Err(e) = ctx.sink.append_record(&record) {
                        self.cancel.cancel();
                        return Err(e.into());
                    }
                    tracing::info!("Extracted {}", record.name);
                    ctx.progress.emit(ProgressEvent::RecordExtracted {
                        url,
                        name: record.name,
                    });
                    report.records += 1;
                }
                RetryOutcome::Exhausted { error, attempts }
                | RetryOutcome::Terminal { error, attempts } => {
                    tracing::warn!("Giving up on {} after {} attempt(s): {}", url, attempts, error);
                    self.fail(&mut report, index, url, attempts, error.to_string());
                }
                RetryOutcome::Cancelled { .. } => break,
            }
        }

        tracing::debug!("Worker {} done", self.id);
        Ok(report)
    }

    fn fail(&self, report: &mut WorkerReport, index: usize, url: String, attempts: u32, reason: String) {
        self.context.progress.emit(ProgressEvent::RecordFailed {
            url: url.clone(),
            attempts,
            reason,
        });
        report.failed.push((index, url));
    }
}
