//! Views over a finished run: the top-N most congested lights in an hour.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use tracing::debug;

use tc_core::Record;

pub const HOURS_PER_DAY: u32 = 24;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopNQuery {
    pub n: usize,
    pub hour: u32,
}

impl TopNQuery {
    pub fn run(&self, records: &[Record]) -> Result<Vec<Record>, QueryError> {
        top_n_in_hour(records, self.hour, self.n)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("hour {0} is outside 0..=23")]
    InvalidHour(u32),
    #[error(
        "insufficient data: asked for {requested} records in hour {hour}, \
         only {available} available"
    )]
    InsufficientData {
        requested: usize,
        available: usize,
        hour: u32,
    },
}

/// The `n` records with the largest count whose time falls in
/// `[hour * 100, (hour + 1) * 100)`, sorted ascending by count.
///
/// Selection partitions the window in expected linear time and only the `n`
/// survivors get sorted. The relative order of equal counts is unspecified.
pub fn top_n_in_hour(records: &[Record], hour: u32, n: usize) -> Result<Vec<Record>, QueryError> {
    if hour >= HOURS_PER_DAY {
        return Err(QueryError::InvalidHour(hour));
    }
    let mut window: Vec<Record> = records.iter().copied().filter(|r| r.in_hour(hour)).collect();
    debug!(hour, window = window.len(), n, "selecting top records");
    if window.len() < n {
        return Err(QueryError::InsufficientData {
            requested: n,
            available: window.len(),
            hour,
        });
    }
    if n == 0 {
        return Ok(Vec::new());
    }

    let split = window.len() - n;
    window.select_nth_unstable_by_key(split, |r| r.count);
    let mut top = window.split_off(split);
    top.sort_by_key(|r| r.count);
    Ok(top)
}

/// Render `top` (ascending by count) most congested first, ranked from 1.
pub fn render_report(top: &[Record]) -> String {
    let mut out = String::new();
    for (rank, rec) in top.iter().rev().enumerate() {
        let _ = write!(
            out,
            "({})\n\tID: {}\n\tTime: {}\n\tCars Passed: {}\n\n",
            rank + 1,
            rec.id,
            rec.time,
            rec.count
        );
    }
    out
}
