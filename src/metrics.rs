//! Observability: timing histograms and event counters for the translation
//! path. Histograms track p50/p95/p99; everything is served as JSON.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// A span measuring elapsed time from creation to explicit end.
pub struct TimingSpan {
    name: &'static str,
    start: Instant,
    registry: Arc<MetricsRegistry>,
}

impl TimingSpan {
    pub fn new(name: &'static str, registry: Arc<MetricsRegistry>) -> Self {
        Self {
            name,
            start: Instant::now(),
            registry,
        }
    }

    /// End the span, recording elapsed duration in milliseconds.
    pub fn finish(self) -> f64 {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        self.registry.record(self.name, elapsed_ms);
        elapsed_ms
    }
}

/// Fixed-capacity ring buffer for histogram samples.
struct SampleRing {
    samples: Vec<f64>,
    pos: usize,
    count: usize,
    capacity: usize,
}

impl SampleRing {
    fn new(capacity: usize) -> Self {
        Self {
            samples: vec![0.0; capacity],
            pos: 0,
            count: 0,
            capacity,
        }
    }

    fn push(&mut self, value: f64) {
        self.samples[self.pos] = value;
        self.pos = (self.pos + 1) % self.capacity;
        if self.count < self.capacity {
            self.count += 1;
        }
    }

    fn percentile(&self, p: f64) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let mut sorted: Vec<f64> = self.samples[..self.count].to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let idx = ((p / 100.0) * (self.count as f64 - 1.0)).round() as usize;
        let idx = idx.min(self.count - 1);
        sorted[idx]
    }
}

#[derive(Default)]
struct Inner {
    histograms: HashMap<&'static str, SampleRing>,
    counters: HashMap<&'static str, u64>,
}

/// Stores histograms and counters for all named metrics.
pub struct MetricsRegistry {
    inner: Mutex<Inner>,
    ring_capacity: usize,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            ring_capacity: 1024,
        }
    }

    /// Record a sample (in milliseconds) for the named metric.
    pub fn record(&self, name: &'static str, value_ms: f64) {
        let mut inner = self.inner.lock();
        inner
            .histograms
            .entry(name)
            .or_insert_with(|| SampleRing::new(self.ring_capacity))
            .push(value_ms);
        tracing::trace!(metric = name, value_ms, "metric_recorded");
    }

    pub fn incr(&self, name: &'static str, by: u64) {
        if by == 0 {
            return;
        }
        *self.inner.lock().counters.entry(name).or_insert(0) += by;
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.inner.lock().counters.get(name).copied().unwrap_or(0)
    }

    /// Start a timing span that records on finish.
    pub fn span(self: &Arc<Self>, name: &'static str) -> TimingSpan {
        TimingSpan::new(name, Arc::clone(self))
    }

    /// Get percentile for a metric (p value 0-100). Returns milliseconds.
    pub fn percentile(&self, name: &str, p: f64) -> f64 {
        let inner = self.inner.lock();
        inner
            .histograms
            .get(name)
            .map(|ring| ring.percentile(p))
            .unwrap_or(0.0)
    }

    /// Snapshot of all histograms at p50/p95/p99 plus all counters.
    pub fn summary(&self) -> MetricsSnapshot {
        let inner = self.inner.lock();
        let histograms = inner
            .histograms
            .iter()
            .map(|(&name, ring)| {
                (
                    name.to_string(),
                    MetricSummary {
                        p50_ms: ring.percentile(50.0),
                        p95_ms: ring.percentile(95.0),
                        p99_ms: ring.percentile(99.0),
                        count: ring.count,
                    },
                )
            })
            .collect();
        let counters = inner
            .counters
            .iter()
            .map(|(&name, &v)| (name.to_string(), v))
            .collect();
        MetricsSnapshot {
            histograms,
            counters,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricSummary {
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub count: usize,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSnapshot {
    pub histograms: HashMap<String, MetricSummary>,
    pub counters: HashMap<String, u64>,
}

/// Well-known metric names (constants to avoid typos).
pub mod metric_names {
    pub const TRANSLATE_BATCH: &str = "t_translate_batch";
    pub const BACKEND_CALL: &str = "t_backend_call";
    pub const CACHE_HIT: &str = "cache_hit";
    pub const CACHE_MISS: &str = "cache_miss";
    pub const BACKEND_FAILURE: &str = "backend_failure";
    pub const ITEM_FALLBACK: &str = "item_fallback";
    pub const REVERT_FROM_SNAPSHOT: &str = "revert_from_snapshot";
    pub const CHAT_MESSAGE: &str = "chat_message";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentiles_over_recorded_samples() {
        let registry = MetricsRegistry::new();
        for v in 1..=100 {
            registry.record(metric_names::TRANSLATE_BATCH, v as f64);
        }
        assert_eq!(registry.percentile(metric_names::TRANSLATE_BATCH, 50.0), 51.0);
        assert_eq!(registry.percentile(metric_names::TRANSLATE_BATCH, 99.0), 99.0);
        assert_eq!(registry.percentile("unknown", 50.0), 0.0);
    }

    #[test]
    fn counters_accumulate_and_show_in_summary() {
        let registry = Arc::new(MetricsRegistry::new());
        registry.incr(metric_names::CACHE_HIT, 3);
        registry.incr(metric_names::CACHE_HIT, 2);
        registry.incr(metric_names::CACHE_MISS, 0);
        registry.span(metric_names::BACKEND_CALL).finish();

        let summary = registry.summary();
        assert_eq!(summary.counters.get(metric_names::CACHE_HIT), Some(&5));
        assert!(!summary.counters.contains_key(metric_names::CACHE_MISS));
        assert_eq!(summary.histograms[metric_names::BACKEND_CALL].count, 1);
    }
}
