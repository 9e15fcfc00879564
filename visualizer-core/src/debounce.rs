//! Deferred extent write-back.
//!
//! Timestamps are milliseconds supplied by the caller, so the front-end owns
//! the actual timer.

use std::time::Duration;

use crate::Extent;

/// At most one pending extent write with a deadline.
#[derive(Debug, Clone)]
pub struct ExtentDebouncer {
    delay_ms: u64,
    pending: Option<(Extent, u64)>,
}

impl ExtentDebouncer {
    /// Create a debouncer with the given delay.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            pending: None,
        }
    }

    /// Arm the write, replacing any pending one; returns its deadline.
    pub fn schedule(&mut self, extent: Extent, now_ms: u64) -> u64 {
        let deadline = now_ms.saturating_add(self.delay_ms);
        self.pending = Some((extent, deadline));
        deadline
    }

    /// Drop any pending write.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Whether a write is pending.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Deadline of the pending write.
    #[must_use]
    pub fn deadline(&self) -> Option<u64> {
        self.pending.map(|(_, deadline)| deadline)
    }

    /// Take the pending extent if its deadline has passed.
    pub fn take_due(&mut self, now_ms: u64) -> Option<Extent> {
        match self.pending {
            Some((extent, deadline)) if now_ms >= deadline => {
                self.pending = None;
                Some(extent)
            }
            _ => None,
        }
    }
}

impl Default for ExtentDebouncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(200))
    }
}
