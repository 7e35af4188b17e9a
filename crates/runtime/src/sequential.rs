//! Single-threaded baseline: alternate one produce step with one consume step.

use std::collections::VecDeque;

use tracing::{error, info, warn};

use tc_core::{Record, RecordSource, SourceError};

use crate::metrics::{MetricsRegistry, RunTimer};
use crate::pipeline::{ConfigError, PipelineError, RunOutcome};

/// Same buffer discipline as the threaded pipeline, with a single sentinel.
///
/// The produce step is skipped while the buffer is full and the consume step
/// is skipped while it is empty, so the loop never blocks.
pub fn run_sequential<S: RecordSource>(
    mut source: S,
    capacity: usize,
) -> Result<RunOutcome, PipelineError> {
    if capacity == 0 {
        return Err(ConfigError::ZeroCapacity.into());
    }
    let timer = RunTimer::start();
    let metrics = MetricsRegistry::default();
    let mut buffer: VecDeque<Option<Record>> = VecDeque::with_capacity(capacity);
    let mut records = Vec::new();
    let mut exhausted = false;
    let mut failure = None;
    let mut peak = 0;

    loop {
        if !exhausted && buffer.len() < capacity {
            match source.next_record() {
                Ok(Some(record)) => {
                    metrics.inc_records_read(1);
                    buffer.push_back(Some(record));
                }
                Ok(None) => exhausted = true,
                Err(SourceError::Malformed { line, source }) => {
                    warn!(line, error = %source, "skipping malformed record");
                    metrics.inc_malformed_lines(1);
                }
                Err(err) => {
                    error!(error = %err, "record source failed; ending input");
                    failure = Some(err);
                    exhausted = true;
                }
            }
            if exhausted {
                buffer.push_back(None);
                metrics.inc_drain_sequences(1);
                metrics.inc_sentinels_pushed(1);
            }
            peak = peak.max(buffer.len());
        }

        match buffer.pop_front() {
            Some(Some(record)) => {
                records.push(record);
                metrics.inc_records_collected(1);
            }
            Some(None) => {
                metrics.inc_sentinels_consumed(1);
                break;
            }
            None => {}
        }
    }

    metrics.record_queue_peak(peak as u64);
    let elapsed = timer.elapsed();
    info!(
        records = records.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "sequential run finished"
    );

    if let Some(err) = failure {
        return Err(PipelineError::Source(err));
    }
    Ok(RunOutcome {
        records,
        metrics: metrics.snapshot(),
        elapsed,
    })
}
