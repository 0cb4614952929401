//! Bounded retries around one fetch-and-parse attempt
//!
//! | Condition                     | Action                                   |
//! |-------------------------------|------------------------------------------|
//! | Timeout / connect / transport | Retry after `backoff` x attempt          |
//! | HTTP >= 400                   | Retry after `backoff` x attempt          |
//! | 403 / 429 / challenge page    | Retry after `blocked-backoff` x attempt  |
//! | Missing business name         | Stop immediately, one attempt            |
//!
//! No pause follows the final attempt.

use crate::config::{DelayRange, RetryConfig};
use crate::crawler::fetcher::{FetchOutcome, NetworkErrorKind};
use crate::crawler::pacing::{scaled_draw, sleep_unless_cancelled};
use crate::parser::ExtractionFailure;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Why one attempt failed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AttemptError {
    #[error("{kind} error: {message}")]
    Network {
        kind: NetworkErrorKind,
        message: String,
    },

    #[error("blocked with HTTP {status}")]
    Blocked { status: u16 },

    #[error("bot challenge page (HTTP {status})")]
    Challenge { status: u16 },

    #[error("HTTP {status}")]
    Http { status: u16 },

    #[error(transparent)]
    MissingIdentity(#[from] ExtractionFailure),
}

impl AttemptError {
    /// Everything except a structurally absent name can change on retry
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::MissingIdentity(_))
    }

    /// Blocks and challenges get the longer backoff
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. } | Self::Challenge { .. })
    }

    /// Splits a fetch outcome into usable content or the failure it represents
    pub fn check(outcome: FetchOutcome) -> Result<String, AttemptError> {
        match outcome {
            FetchOutcome::Page { body, .. } => Ok(body),
            FetchOutcome::Challenge { status, .. } => Err(Self::Challenge { status }),
            FetchOutcome::Blocked { status, .. } => Err(Self::Blocked { status }),
            FetchOutcome::HttpError { status } => Err(Self::Http { status }),
            FetchOutcome::NetworkError { kind, message } => Err(Self::Network { kind, message }),
        }
    }
}

/// How a retried operation ended
#[derive(Debug)]
pub enum RetryOutcome<T> {
    Succeeded { value: T, attempts: u32 },

    /// Every attempt failed with a retryable error
    Exhausted { error: AttemptError, attempts: u32 },

    /// An attempt failed in a way no retry can fix
    Terminal { error: AttemptError, attempts: u32 },

    /// The run was cancelled during a backoff pause
    Cancelled { attempts: u32 },
}

impl<T> RetryOutcome<T> {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Succeeded { attempts, .. }
            | Self::Exhausted { attempts, .. }
            | Self::Terminal { attempts, .. }
            | Self::Cancelled { attempts } => *attempts,
        }
    }
}

/// Attempt budget and backoff ranges
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: DelayRange,
    pub blocked_backoff: DelayRange,
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff: config.backoff,
            blocked_backoff: config.blocked_backoff,
        }
    }
}

impl RetryPolicy {
    /// Pause before the attempt following failed attempt number `attempt`
    pub fn backoff_for(&self, error: &AttemptError, attempt: u32) -> Duration {
        let range = if error.is_blocked() {
            self.blocked_backoff
        } else {
            self.backoff
        };
        scaled_draw(range, attempt)
    }

    /// Runs `operation` until it succeeds, fails terminally or the budget runs out
    ///
    /// `on_retry` is told about every scheduled retry (failed attempt number,
    /// pause, error) before the pause starts.
    ///
    /// # Arguments
    ///
    /// * `cancel` - Interrupts backoff pauses
    /// * `on_retry` - Retry observer, for logging and progress events
    /// * `operation` - One attempt, given its 1-based attempt number
    pub async fn run<T, F, Fut, R>(
        &self,
        cancel: &CancellationToken,
        mut on_retry: R,
        mut operation: F,
    ) -> RetryOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, AttemptError>>,
        R: FnMut(u32, Duration, &AttemptError),
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error = match operation(attempt).await {
                Ok(value) => {
                    return RetryOutcome::Succeeded {
                        value,
                        attempts: attempt,
                    }
                }
                Err(error) => error,
            };

            if !error.is_retryable() {
                return RetryOutcome::Terminal {
                    error,
                    attempts: attempt,
                };
            }
            if attempt >= max_attempts {
                return RetryOutcome::Exhausted {
                    error,
                    attempts: attempt,
                };
            }

            let delay = self.backoff_for(&error, attempt);
            on_retry(attempt, delay, &error);

            if !sleep_unless_cancelled(delay, cancel).await {
                return RetryOutcome::Cancelled { attempts: attempt };
            }
        }
    }
}
