//! Call-level metrics: one [`CallRecord`] per completed operation attempt
//! sequence, aggregated into a [`MetricsSummary`] on demand.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Metrics captured for one completed call, after its retry loop ends
/// (successfully or not).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CallRecord {
    /// The operation this call invoked.
    pub operation_id: String,
    /// Wall-clock duration across every attempt, in milliseconds.
    pub duration_ms: u64,
    /// Number of attempts made, including the first.
    pub attempts: u32,
    /// Whether the call ultimately succeeded.
    pub success: bool,
    /// Stable catalog code of the terminal error, if any.
    pub error_code: Option<String>,
}

/// Aggregated statistics across recorded calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsSummary {
    /// Number of calls recorded.
    pub count: usize,
    /// Mean duration in milliseconds.
    pub mean_duration_ms: f64,
    /// Median (p50) duration in milliseconds.
    pub p50_duration_ms: f64,
    /// 99th-percentile duration in milliseconds.
    pub p99_duration_ms: f64,
    /// Mean attempts per call.
    pub mean_attempts: f64,
    /// success / count.
    pub success_rate: f64,
    /// Per-operation call counts, deterministically ordered.
    pub operation_counts: BTreeMap<String, usize>,
}

impl Default for MetricsSummary {
    fn default() -> Self {
        Self {
            count: 0,
            mean_duration_ms: 0.0,
            p50_duration_ms: 0.0,
            p99_duration_ms: 0.0,
            mean_attempts: 0.0,
            success_rate: 0.0,
            operation_counts: BTreeMap::new(),
        }
    }
}

fn percentile(sorted: &[u64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0] as f64;
    }
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    sorted[lower] as f64 * (1.0 - frac) + sorted[upper] as f64 * frac
}

/// Thread-safe collector for [`CallRecord`]s.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    inner: Arc<Mutex<Vec<CallRecord>>>,
}

impl MetricsCollector {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed call.
    pub fn record(&self, record: CallRecord) {
        self.inner.lock().push(record);
    }

    /// All recorded calls, in recording order.
    #[must_use]
    pub fn records(&self) -> Vec<CallRecord> {
        self.inner.lock().clone()
    }

    /// Number of calls recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// `true` if no calls have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all recorded calls.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Compute an aggregated summary of every call recorded so far.
    #[must_use]
    pub fn summary(&self) -> MetricsSummary {
        let data = self.inner.lock();
        if data.is_empty() {
            return MetricsSummary::default();
        }

        let count = data.len();
        let mut durations: Vec<u64> = data.iter().map(|r| r.duration_ms).collect();
        durations.sort_unstable();

        let mean_duration_ms = durations.iter().sum::<u64>() as f64 / count as f64;
        let p50_duration_ms = percentile(&durations, 50.0);
        let p99_duration_ms = percentile(&durations, 99.0);
        let mean_attempts = data.iter().map(|r| r.attempts as u64).sum::<u64>() as f64 / count as f64;
        let successes = data.iter().filter(|r| r.success).count();
        let success_rate = successes as f64 / count as f64;

        let mut operation_counts: BTreeMap<String, usize> = BTreeMap::new();
        for r in data.iter() {
            *operation_counts.entry(r.operation_id.clone()).or_insert(0) += 1;
        }

        MetricsSummary {
            count,
            mean_duration_ms,
            p50_duration_ms,
            p99_duration_ms,
            mean_attempts,
            success_rate,
            operation_counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(operation_id: &str, duration_ms: u64, attempts: u32, success: bool) -> CallRecord {
        CallRecord { operation_id: operation_id.to_string(), duration_ms, attempts, success, error_code: None }
    }

    #[test]
    fn empty_collector_summary_is_zeroed() {
        let c = MetricsCollector::new();
        let s = c.summary();
        assert_eq!(s.count, 0);
        assert_eq!(s.mean_duration_ms, 0.0);
    }

    #[test]
    fn summary_aggregates_duration_and_success_rate() {
        let c = MetricsCollector::new();
        c.record(sample("PutObject", 10, 1, true));
        c.record(sample("PutObject", 30, 2, false));
        let s = c.summary();
        assert_eq!(s.count, 2);
        assert!((s.mean_duration_ms - 20.0).abs() < f64::EPSILON);
        assert!((s.mean_attempts - 1.5).abs() < f64::EPSILON);
        assert!((s.success_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(s.operation_counts["PutObject"], 2);
    }

    #[test]
    fn clear_resets_collector() {
        let c = MetricsCollector::new();
        c.record(sample("GetObject", 5, 1, true));
        c.clear();
        assert!(c.is_empty());
    }

    #[test]
    fn percentile_of_single_value_is_itself() {
        assert_eq!(percentile(&[42], 99.0), 42.0);
    }
}
