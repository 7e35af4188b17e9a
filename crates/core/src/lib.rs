//! Core types and traits for the traffic control simulator.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub mod parse;
pub mod source;

pub use parse::ParseRecordError;
pub use source::{LineSource, RecordSource, SourceError, VecSource};

/// HHMM-style clock value. Comparable, but not base-60 arithmetic.
pub type ClockTime = i64;
pub type LightId = i64;
pub type CarCount = i64;

/// One traffic light reading: how many cars passed light `id` at `time`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Record {
    pub time: ClockTime,
    pub id: LightId,
    pub count: CarCount,
}

impl Record {
    pub const fn new(time: ClockTime, id: LightId, count: CarCount) -> Self {
        Self { time, id, count }
    }

    /// Hour of day this reading falls in (`1530` -> `15`).
    pub fn hour(&self) -> i64 {
        self.time.div_euclid(100)
    }

    /// True when `time` lies in `[hour * 100, (hour + 1) * 100)`.
    pub fn in_hour(&self, hour: u32) -> bool {
        self.hour() == i64::from(hour)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error("failed to open data file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_truncates_minutes() {
        assert_eq!(Record::new(1530, 3, 100).hour(), 15);
        assert_eq!(Record::new(45, 3, 100).hour(), 0);
    }

    #[test]
    fn in_hour_is_half_open() {
        assert!(Record::new(1000, 1, 1).in_hour(10));
        assert!(Record::new(1059, 1, 1).in_hour(10));
        assert!(!Record::new(1100, 1, 1).in_hour(10));
        assert!(!Record::new(959, 1, 1).in_hour(10));
    }
}
