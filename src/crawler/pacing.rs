//! Randomized pauses between network calls
//!
//! Every pause is drawn uniformly from a configured millisecond range and can
//! be interrupted by the run's cancellation token. A `Pacer` is cheap to clone;
//! each extraction worker owns one so pauses apply per worker.

use crate::config::{DelayRange, PacingConfig};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// The situations a pause is taken in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseKind {
    /// After the homepage visit that opens a session
    WarmUp,

    /// Before the next result page after a productive one
    BetweenPages,

    /// Before the next result page after one without result cards
    AfterEmptyPage,

    /// Before the next result page after a failed fetch
    AfterFailure,

    /// Before re-fetching a page that answered with a challenge or block
    ChallengeWait,

    /// Before the next listing in an extraction worker
    BetweenRecords,
}

#[derive(Debug, Clone)]
pub struct Pacer {
    config: PacingConfig,
}

impl Pacer {
    pub fn new(config: PacingConfig) -> Self {
        Self { config }
    }

    /// The configured range for a pause kind
    pub fn range(&self, kind: PauseKind) -> DelayRange {
        match kind {
            PauseKind::WarmUp => self.config.warm_up,
            PauseKind::BetweenPages => self.config.between_pages,
            PauseKind::AfterEmptyPage => self.config.after_empty_page,
            PauseKind::AfterFailure => self.config.after_failure,
            PauseKind::ChallengeWait => self.config.challenge_wait,
            PauseKind::BetweenRecords => self.config.between_records,
        }
    }

    /// Pauses for a random duration from the range of `kind`
    ///
    /// Returns false if the run was cancelled before or during the pause.
    pub async fn pause(&self, kind: PauseKind, cancel: &CancellationToken) -> bool {
        let delay = draw(self.range(kind));
        tracing::debug!("Pausing {:?} for {:?}", kind, delay);
        sleep_unless_cancelled(delay, cancel).await
    }
}

/// Draws a duration uniformly from an inclusive range
///
/// A range whose maximum does not exceed its minimum yields the minimum.
pub fn draw(range: DelayRange) -> Duration {
    if range.max_ms <= range.min_ms {
        return range.min();
    }
    Duration::from_millis(rand::random_range(range.min_ms..=range.max_ms))
}

/// A draw from `range` multiplied by `factor`
///
/// Used for retry backoff, which grows linearly with the attempt number.
pub fn scaled_draw(range: DelayRange, factor: u32) -> Duration {
    draw(range).saturating_mul(factor)
}

/// Sleeps for `delay` unless `cancel` fires first
///
/// Returns false if the token was (or became) cancelled.
pub async fn sleep_unless_cancelled(delay: Duration, cancel: &CancellationToken) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    if delay.is_zero() {
        return true;
    }

    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
