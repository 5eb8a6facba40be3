//! Finalized time-log entries.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Timestamp;

/// One completed timed interval. Immutable once created; the net
/// duration is always derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub project: String,
    pub start: Timestamp,
    pub stop: Timestamp,
    /// Total seconds spent paused between `start` and `stop`.
    pub pause_total: i64,
}

impl LogEntry {
    /// Build an entry with a fresh id. Inputs are clamped so that
    /// `stop >= start` and `0 <= pause_total <= stop - start` hold
    /// whatever the clock did.
    pub fn new(project: &str, start: Timestamp, stop: Timestamp, pause_total: i64) -> Self {
        let stop = stop.max(start);
        let pause_total = pause_total.clamp(0, stop - start);
        Self {
            id: Uuid::new_v4(),
            project: project.to_string(),
            start,
            stop,
            pause_total,
        }
    }

    /// Net recorded seconds: `stop - start - pause_total`.
    pub fn duration(&self) -> i64 {
        self.stop - self.start - self.pause_total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_subtracts_pause() {
        let entry = LogEntry::new("Work", 1000, 1300, 50);
        assert_eq!(entry.duration(), 250);
    }

    #[test]
    fn stop_is_clamped_to_start() {
        let entry = LogEntry::new("Work", 1000, 900, 0);
        assert_eq!(entry.stop, 1000);
        assert_eq!(entry.duration(), 0);
    }

    #[test]
    fn pause_is_clamped_into_the_interval() {
        let entry = LogEntry::new("Work", 1000, 1100, 500);
        assert_eq!(entry.pause_total, 100);
        assert_eq!(entry.duration(), 0);

        let entry = LogEntry::new("Work", 1000, 1100, -5);
        assert_eq!(entry.pause_total, 0);
        assert_eq!(entry.duration(), 100);
    }
}
