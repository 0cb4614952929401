//! Structured progress events
//!
//! Library code never prints. Long-running operations emit `ProgressEvent`s
//! through a `ProgressReporter`; whoever holds the receiving end decides how
//! to render them.

use crate::state::StopReason;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// One observable step of a discovery or extraction run
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    DiscoveryStarted {
        search_term: String,
        region: String,
    },

    /// A result page answered (status is None on a transport failure)
    PageFetched {
        page: u32,
        status: Option<u16>,
    },

    /// A result page answered with a challenge or block; a forced wait follows
    ChallengeDetected {
        page: u32,
        status: u16,
    },

    PageParsed {
        page: u32,
        cards: usize,
        new_urls: usize,
        total_urls: usize,
    },

    DiscoveryFinished {
        stop_reason: StopReason,
        total_urls: usize,
    },

    ExtractionStarted {
        total: usize,
    },

    /// Processing of the `index`-th (1-based) URL began
    RecordStarted {
        index: usize,
        total: usize,
        url: String,
    },

    RetryScheduled {
        url: String,
        attempt: u32,
        delay: Duration,
        reason: String,
    },

    RecordExtracted {
        url: String,
        name: String,
    },

    RecordFailed {
        url: String,
        attempts: u32,
        reason: String,
    },

    ExtractionFinished {
        records: usize,
        failed: usize,
        skipped: usize,
    },
}

/// Sending half of the progress channel
///
/// Cloning is cheap. A reporter without a subscriber, or whose receiver has
/// been dropped, discards events.
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    sender: Option<UnboundedSender<ProgressEvent>>,
}

impl ProgressReporter {
    pub fn new(sender: UnboundedSender<ProgressEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// A reporter paired with a fresh receiver
    pub fn channel() -> (Self, UnboundedReceiver<ProgressEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }

    /// A reporter that drops every event
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: ProgressEvent) {
        if let Some(sender) = &self.sender {
            // A closed receiver only means nobody is listening any more
            let _ = sender.send(event);
        }
    }
}
