/// Consecutive-failure counter for a discovery run
///
/// Fetch errors, pages without result cards and pages that add no new URLs
/// all count as one failure. Any page that adds at least one new URL resets
/// the streak. The run stops once the streak reaches the threshold.
#[derive(Debug, Clone)]
pub struct FailureBudget {
    consecutive: u32,
    threshold: u32,
}

impl FailureBudget {
    /// Creates a budget that is exhausted after `threshold` failures in a row
    pub fn new(threshold: u32) -> Self {
        Self {
            consecutive: 0,
            threshold: threshold.max(1),
        }
    }

    /// Records an unproductive page and returns the new streak length
    pub fn record_failure(&mut self) -> u32 {
        self.consecutive = self.consecutive.saturating_add(1);
        self.consecutive
    }

    /// Records a page that produced new URLs
    pub fn record_success(&mut self) {
        self.consecutive = 0;
    }

    /// Records the yield of a parsed page
    pub fn record_yield(&mut self, new_urls: usize) {
        if new_urls == 0 {
            self.record_failure();
        } else {
            self.record_success();
        }
    }

    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Returns true once the streak has reached the threshold
    pub fn is_exhausted(&self) -> bool {
        self.consecutive >= self.threshold
    }
}
