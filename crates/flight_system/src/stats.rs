//! Handler duration metrics.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;

/// Counts and duration extremes over every handled delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Number of handler invocations that completed.
    pub handled: u64,
    /// Fastest handler run.
    pub min: Option<Duration>,
    /// Slowest handler run.
    pub max: Option<Duration>,
    /// Sum of every handler run.
    pub total: Duration,
}

impl RunStats {
    /// Fold one handler duration in.
    pub fn record(&mut self, elapsed: Duration) {
        self.handled += 1;
        self.total = self.total.saturating_add(elapsed);
        self.min = Some(self.min.map_or(elapsed, |m| m.min(elapsed)));
        self.max = Some(self.max.map_or(elapsed, |m| m.max(elapsed)));
    }

    /// Mean handler duration, if anything was handled.
    #[must_use]
    pub fn mean(&self) -> Option<Duration> {
        let n = u32::try_from(self.handled).ok().filter(|&n| n > 0)?;
        Some(self.total / n)
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max, self.mean()) {
            (Some(min), Some(max), Some(mean)) => write!(
                f,
                "{} handled, min {min:?}, max {max:?}, mean {mean:?}",
                self.handled
            ),
            _ => write!(f, "{} handled", self.handled),
        }
    }
}

/// Shared recorder handed to every worker task.
#[derive(Debug, Clone, Default)]
pub(crate) struct StatsRecorder {
    inner: Arc<Mutex<RunStats>>,
}

impl StatsRecorder {
    pub(crate) fn record(&self, elapsed: Duration) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(elapsed);
    }

    pub(crate) fn snapshot(&self) -> RunStats {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stats() {
        let stats = RunStats::default();
        assert_eq!(stats.mean(), None);
        assert_eq!(stats.to_string(), "0 handled");
    }

    #[test]
    fn test_record_tracks_extremes() {
        let mut stats = RunStats::default();
        stats.record(Duration::from_millis(30));
        stats.record(Duration::from_millis(10));
        stats.record(Duration::from_millis(20));
        assert_eq!(stats.handled, 3);
        assert_eq!(stats.min, Some(Duration::from_millis(10)));
        assert_eq!(stats.max, Some(Duration::from_millis(30)));
        assert_eq!(stats.mean(), Some(Duration::from_millis(20)));
    }

    #[test]
    fn test_recorder_is_shared() {
        let recorder = StatsRecorder::default();
        let clone = recorder.clone();
        clone.record(Duration::from_millis(5));
        assert_eq!(recorder.snapshot().handled, 1);
    }
}
