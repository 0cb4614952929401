//! State module for tracking discovery progress
//!
//! # Components
//!
//! - `DiscoveryState`: where a pagination run is (fetching, parsing, extracting,
//!   deciding on the next page, done)
//! - `StopReason`: why a run reached `Done`
//! - `FailureBudget`: the consecutive-failure counter that bounds unproductive
//!   crawling

mod failure_budget;
mod page_state;

// Re-export main types
pub use failure_budget::FailureBudget;
pub use page_state::{DiscoveryState, StopReason};
