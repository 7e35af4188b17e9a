//! Producer/consumer pools around a shared [`BoundedQueue`].

use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use tc_core::{Record, RecordSource, SourceError};

use crate::metrics::{MetricsRegistry, MetricsSnapshot, RunTimer};
use crate::queue::{BoundedQueue, Phase};

pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineConfig {
    pub capacity: usize,
    pub producers: usize,
    pub consumers: usize,
}

impl Default for PipelineConfig {
    /// Half of the logical CPUs produce, the rest consume.
    fn default() -> Self {
        let threads = num_cpus::get().max(2);
        Self {
            capacity: DEFAULT_CAPACITY,
            producers: threads / 2,
            consumers: threads - threads / 2,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.producers == 0 {
            return Err(ConfigError::NoProducers);
        }
        if self.consumers == 0 {
            return Err(ConfigError::NoConsumers);
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("queue capacity must be at least 1")]
    ZeroCapacity,
    #[error("at least one producer thread is required")]
    NoProducers,
    #[error("at least one consumer thread is required")]
    NoConsumers,
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("record source failed: {0}")]
    Source(#[source] SourceError),
}

/// Everything a finished run hands back to the caller.
#[derive(Debug)]
pub struct RunOutcome {
    /// Collected records, in no particular order.
    pub records: Vec<Record>,
    pub metrics: MetricsSnapshot,
    pub elapsed: Duration,
}

pub struct Pipeline {
    cfg: PipelineConfig,
    metrics: MetricsRegistry,
}

impl Pipeline {
    pub fn new(cfg: PipelineConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            metrics: MetricsRegistry::default(),
        })
    }

    /// Also add every run's counters to `metrics`. Each [`RunOutcome`] still
    /// reports only its own run.
    pub fn with_metrics(mut self, metrics: MetricsRegistry) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.cfg
    }

    /// Drain `source` through the producer and consumer pools.
    ///
    /// Blocks until every worker has joined. An I/O failure in the source ends
    /// input early: workers still shut down through the sentinels, the
    /// collected records are discarded and the failure is returned. The
    /// shared registry counts the failed run all the same.
    pub fn run<S: RecordSource>(&self, source: S) -> Result<RunOutcome, PipelineError> {
        let timer = RunTimer::start();
        let metrics = MetricsRegistry::default();
        let queue = BoundedQueue::new(self.cfg.capacity);
        let reader = Mutex::new(source);
        let results = Mutex::new(Vec::new());
        let failure = Mutex::new(None);

        info!(
            capacity = self.cfg.capacity,
            producers = self.cfg.producers,
            consumers = self.cfg.consumers,
            "starting pipeline"
        );

        thread::scope(|s| {
            for index in 0..self.cfg.consumers {
                let worker = Consumer {
                    index,
                    queue: &queue,
                    results: &results,
                    metrics: &metrics,
                };
                s.spawn(move || worker.run());
            }
            for index in 0..self.cfg.producers {
                let worker = Producer {
                    index,
                    consumers: self.cfg.consumers,
                    queue: &queue,
                    reader: &reader,
                    failure: &failure,
                    metrics: &metrics,
                };
                s.spawn(move || worker.run());
            }
        });

        queue.mark_joined();
        metrics.record_queue_peak(queue.peak_len() as u64);
        let snapshot = metrics.snapshot();
        self.metrics.absorb(&snapshot);
        debug_assert_eq!(queue.sentinels_pushed(), self.cfg.consumers);
        debug_assert_eq!(queue.sentinels_popped(), self.cfg.consumers);

        let elapsed = timer.elapsed();
        let records = results.into_inner();
        info!(
            records = records.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "pipeline joined"
        );

        if let Some(err) = failure.into_inner() {
            return Err(PipelineError::Source(err));
        }
        Ok(RunOutcome {
            records,
            metrics: snapshot,
            elapsed,
        })
    }
}

struct Producer<'a, S> {
    index: usize,
    consumers: usize,
    queue: &'a BoundedQueue<Record>,
    reader: &'a Mutex<S>,
    failure: &'a Mutex<Option<SourceError>>,
    metrics: &'a MetricsRegistry,
}

impl<S: RecordSource> Producer<'_, S> {
    fn run(self) {
        debug!(producer = self.index, "producer started");
        loop {
            self.queue.wait_for_space();

            // Held from read to enqueue so nothing read can land behind the
            // sentinels, and records keep source order.
            let mut reader = self.reader.lock();
            if self.queue.phase() != Phase::Running {
                break;
            }
            match reader.next_record() {
                Ok(Some(record)) => {
                    self.metrics.inc_records_read(1);
                    self.queue.push(record);
                }
                Ok(None) => {
                    self.drain();
                    break;
                }
                Err(SourceError::Malformed { line, source }) => {
                    warn!(
                        producer = self.index,
                        line,
                        error = %source,
                        "skipping malformed record"
                    );
                    self.metrics.inc_malformed_lines(1);
                }
                Err(err) => {
                    error!(
                        producer = self.index,
                        error = %err,
                        "record source failed; ending input"
                    );
                    let mut failure = self.failure.lock();
                    if failure.is_none() {
                        *failure = Some(err);
                    }
                    drop(failure);
                    self.drain();
                    break;
                }
            }
        }
        debug!(producer = self.index, "producer exiting");
    }

    fn drain(&self) {
        if self.queue.announce_exhaustion(self.consumers) {
            self.metrics.inc_drain_sequences(1);
            self.metrics.inc_sentinels_pushed(self.consumers as u64);
            info!(
                producer = self.index,
                sentinels = self.consumers,
                "source exhausted; sentinels queued"
            );
        } else {
            debug!(producer = self.index, "source already drained");
        }
    }
}

struct Consumer<'a> {
    index: usize,
    queue: &'a BoundedQueue<Record>,
    results: &'a Mutex<Vec<Record>>,
    metrics: &'a MetricsRegistry,
}

impl Consumer<'_> {
    fn run(self) {
        debug!(consumer = self.index, "consumer started");
        let mut collected = 0u64;
        while let Some(record) = self.queue.pop() {
            self.results.lock().push(record);
            self.metrics.inc_records_collected(1);
            collected += 1;
        }
        self.metrics.inc_sentinels_consumed(1);
        debug!(consumer = self.index, collected, "consumer received sentinel");
    }
}
