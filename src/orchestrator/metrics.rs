//! Counters and the read-only metrics snapshot.

use serde::{Deserialize, Serialize};

/// Monotonic dispatch counters kept by the orchestrator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Counters {
    pub processed: u64,
    pub errors: u64,
}

impl Counters {
    pub fn record(&mut self, failed: bool) {
        self.processed += 1;
        if failed {
            self.errors += 1;
        }
    }
}

/// Point-in-time view of orchestrator state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Operations dispatched through `process_context`.
    pub processed: u64,
    /// Of those, how many returned an error.
    pub errors: u64,
    /// Stored contexts.
    pub memory_size: usize,
    /// Total connection edges.
    pub connection_count: usize,
    /// Most recent activity timestamp (Unix seconds).
    pub last_activity: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record() {
        let mut counters = Counters::default();
        counters.record(false);
        counters.record(true);
        counters.record(false);
        assert_eq!(counters, Counters { processed: 3, errors: 1 });
    }

    #[test]
    fn test_snapshot_serializes() {
        let snapshot = MetricsSnapshot {
            processed: 2,
            memory_size: 1,
            ..MetricsSnapshot::default()
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["processed"], serde_json::json!(2));
        assert_eq!(value["last_activity"], serde_json::Value::Null);
    }
}
