use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

#[derive(Clone, Default)]
pub struct MetricsRegistry {
    inner: Arc<MetricsInner>,
}

#[derive(Default)]
struct MetricsInner {
    records_read: AtomicU64,
    malformed_lines: AtomicU64,
    records_collected: AtomicU64,
    sentinels_pushed: AtomicU64,
    sentinels_consumed: AtomicU64,
    drain_sequences: AtomicU64,
    queue_peak_len: AtomicU64,
}

impl MetricsRegistry {
    pub fn inc_records_read(&self, delta: u64) {
        self.inner.records_read.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_malformed_lines(&self, delta: u64) {
        self.inner.malformed_lines.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_records_collected(&self, delta: u64) {
        self.inner.records_collected.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_sentinels_pushed(&self, delta: u64) {
        self.inner.sentinels_pushed.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_sentinels_consumed(&self, delta: u64) {
        self.inner.sentinels_consumed.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_drain_sequences(&self, delta: u64) {
        self.inner.drain_sequences.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn record_queue_peak(&self, len: u64) {
        self.inner.queue_peak_len.fetch_max(len, Ordering::Relaxed);
    }

    /// Fold one run's counters into this registry. The queue peak is a
    /// high-water mark, not a sum.
    pub fn absorb(&self, run: &MetricsSnapshot) {
        self.inc_records_read(run.records_read);
        self.inc_malformed_lines(run.malformed_lines);
        self.inc_records_collected(run.records_collected);
        self.inc_sentinels_pushed(run.sentinels_pushed);
        self.inc_sentinels_consumed(run.sentinels_consumed);
        self.inc_drain_sequences(run.drain_sequences);
        self.record_queue_peak(run.queue_peak_len);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_read: self.inner.records_read.load(Ordering::Relaxed),
            malformed_lines: self.inner.malformed_lines.load(Ordering::Relaxed),
            records_collected: self.inner.records_collected.load(Ordering::Relaxed),
            sentinels_pushed: self.inner.sentinels_pushed.load(Ordering::Relaxed),
            sentinels_consumed: self.inner.sentinels_consumed.load(Ordering::Relaxed),
            drain_sequences: self.inner.drain_sequences.load(Ordering::Relaxed),
            queue_peak_len: self.inner.queue_peak_len.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub records_read: u64,
    pub malformed_lines: u64,
    pub records_collected: u64,
    pub sentinels_pushed: u64,
    pub sentinels_consumed: u64,
    pub drain_sequences: u64,
    pub queue_peak_len: u64,
}

impl MetricsSnapshot {
    pub fn to_json_line(&self, label: &str, elapsed: Option<Duration>) -> String {
        #[derive(Serialize)]
        struct Snapshot<'a> {
            label: &'a str,
            #[serde(flatten)]
            counters: &'a MetricsSnapshot,
            elapsed_ms: Option<u128>,
        }

        let payload = Snapshot {
            label,
            counters: self,
            elapsed_ms: elapsed.map(|d| d.as_millis()),
        };
        serde_json::to_string(&payload).unwrap_or_else(|_| String::from("{}"))
    }
}

pub struct RunTimer {
    start: Instant,
}

impl RunTimer {
    pub fn start() -> Self {
        Self { start: Instant::now() }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_counters() {
        let metrics = MetricsRegistry::default();
        let other = metrics.clone();
        metrics.inc_records_read(3);
        other.inc_records_read(2);
        other.record_queue_peak(7);
        metrics.record_queue_peak(4);

        let snap = metrics.snapshot();
        assert_eq!(snap.records_read, 5);
        assert_eq!(snap.queue_peak_len, 7);
    }

    #[test]
    fn absorb_sums_counters_and_keeps_peak() {
        let total = MetricsRegistry::default();
        for peak in [3, 9, 5] {
            let run = MetricsRegistry::default();
            run.inc_drain_sequences(1);
            run.inc_sentinels_pushed(2);
            run.record_queue_peak(peak);
            total.absorb(&run.snapshot());
        }

        let snap = total.snapshot();
        assert_eq!(snap.drain_sequences, 3);
        assert_eq!(snap.sentinels_pushed, 6);
        assert_eq!(snap.queue_peak_len, 9);
    }

    #[test]
    fn json_line_flattens_counters() {
        let metrics = MetricsRegistry::default();
        metrics.inc_drain_sequences(1);
        let line = metrics
            .snapshot()
            .to_json_line("run", Some(Duration::from_millis(12)));

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["label"], "run");
        assert_eq!(value["drain_sequences"], 1);
        assert_eq!(value["elapsed_ms"], 12);
    }
}
