/// Discovery state definitions for tracking a pagination run
///
/// A discovery run walks result pages in order. Each page moves through
/// `Fetching -> Parsing -> Extracting -> NextPageDecision` before the run either
/// fetches the following page or stops in `Done`.
use std::fmt;

/// Why a discovery run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// The last page showed no usable "next" control
    NoNextPage,

    /// Too many consecutive unproductive pages
    FailureThreshold,

    /// The hard page ceiling was reached
    PageCeiling,

    /// The caller cancelled the run
    Cancelled,
}

impl StopReason {
    /// Returns true if the run ended because its budget ran out
    pub fn is_exhaustion(&self) -> bool {
        matches!(self, Self::FailureThreshold | Self::PageCeiling)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoNextPage => "no_next_page",
            Self::FailureThreshold => "failure_threshold",
            Self::PageCeiling => "page_ceiling",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents where a discovery run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscoveryState {
    /// Requesting a result page
    Fetching { page: u32 },

    /// Locating result cards on a fetched page
    Parsing { page: u32 },

    /// Pulling listing links out of the cards
    Extracting { page: u32 },

    /// Deciding whether a following page exists
    NextPageDecision { page: u32 },

    /// Terminal state
    Done(StopReason),
}

impl DiscoveryState {
    /// The starting state of every run
    pub const fn start() -> Self {
        Self::Fetching { page: 1 }
    }

    /// Returns true if the run has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    /// The page this state refers to, if any
    pub fn page(&self) -> Option<u32> {
        match self {
            Self::Fetching { page }
            | Self::Parsing { page }
            | Self::Extracting { page }
            | Self::NextPageDecision { page } => Some(*page),
            Self::Done(_) => None,
        }
    }

    /// Checks whether moving to `next` is a legal step
    ///
    /// Legal steps:
    /// - Fetching(n) -> Parsing(n) | Fetching(n+1) | Done
    /// - Parsing(n) -> Extracting(n) | Fetching(n+1) | Done
    /// - Extracting(n) -> NextPageDecision(n) | Done
    /// - NextPageDecision(n) -> Fetching(n+1) | Done
    ///
    /// Fetching(n) -> Fetching(n+1) covers a failed fetch, and
    /// Parsing(n) -> Fetching(n+1) a page without result cards, which never
    /// reaches the next-page decision.
    /// Nothing leaves `Done`.
    pub fn can_transition_to(&self, next: &DiscoveryState) -> bool {
        use DiscoveryState::*;

        match (*self, *next) {
            (Done(_), _) => false,
            (_, Done(_)) => true,
            (Fetching { page: a }, Parsing { page: b }) => a == b,
            (Fetching { page: a }, Fetching { page: b }) => a.checked_add(1) == Some(b),
            (Parsing { page: a }, Extracting { page: b }) => a == b,
            (Parsing { page: a }, Fetching { page: b }) => a.checked_add(1) == Some(b),
            (Extracting { page: a }, NextPageDecision { page: b }) => a == b,
            (NextPageDecision { page: a }, Fetching { page: b }) => a.checked_add(1) == Some(b),
            _ => false,
        }
    }
}

impl fmt::Display for DiscoveryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetching { page } => write!(f, "fetching(page {})", page),
            Self::Parsing { page } => write!(f, "parsing(page {})", page),
            Self::Extracting { page } => write!(f, "extracting(page {})", page),
            Self::NextPageDecision { page } => write!(f, "next_page_decision(page {})", page),
            Self::Done(reason) => write!(f, "done({})", reason),
        }
    }
}
