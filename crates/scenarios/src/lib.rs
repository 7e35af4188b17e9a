//! Synthetic traffic data: one reading per light for every quarter hour.

use std::io::{self, Write};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use tc_core::{CarCount, ClockTime, Record};

pub const SLOTS_PER_DAY: usize = 24 * 4;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticTraffic {
    pub lights: u32,
    /// Counts are drawn uniformly from `0..=max_cars`. Wide enough that the
    /// busiest lights rarely tie for small N.
    pub max_cars: CarCount,
    pub seed: u64,
}

impl Default for SyntheticTraffic {
    fn default() -> Self {
        Self {
            lights: 1000,
            max_cars: 100_000,
            seed: 0,
        }
    }
}

/// `0000, 0015, 0030, 0045, 0100, ... 2345`.
pub fn quarter_hours() -> impl Iterator<Item = ClockTime> {
    (0..24).flat_map(|hour| [0, 15, 30, 45].into_iter().map(move |minute| hour * 100 + minute))
}

impl SyntheticTraffic {
    /// Number of records a full day produces.
    pub fn len(&self) -> usize {
        SLOTS_PER_DAY * self.lights as usize
    }

    pub fn is_empty(&self) -> bool {
        self.lights == 0
    }

    /// Time-major: every light for `0000`, then every light for `0015`, and so on.
    pub fn records(&self) -> impl Iterator<Item = Record> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let lights = i64::from(self.lights);
        let max_cars = self.max_cars.max(0);
        quarter_hours()
            .flat_map(move |time| (1..=lights).map(move |id| (time, id)))
            .map(move |(time, id)| Record::new(time, id, rng.gen_range(0..=max_cars)))
    }

    /// Write a data file, one `HHMM id count` line per record. Returns the
    /// number of lines written.
    pub fn write_to<W: Write>(&self, mut out: W) -> io::Result<u64> {
        let mut written = 0;
        for rec in self.records() {
            writeln!(out, "{:04} {} {}", rec.time, rec.id, rec.count)?;
            written += 1;
        }
        out.flush()?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_hours_cover_the_day() {
        let times: Vec<_> = quarter_hours().collect();
        assert_eq!(times.len(), SLOTS_PER_DAY);
        assert_eq!(&times[..5], &[0, 15, 30, 45, 100]);
        assert_eq!(times.last(), Some(&2345));
    }

    #[test]
    fn emits_every_light_per_slot() {
        let gen = SyntheticTraffic {
            lights: 3,
            max_cars: 10,
            seed: 7,
        };
        let records: Vec<_> = gen.records().collect();
        assert_eq!(records.len(), gen.len());
        assert_eq!(records[0].id, 1);
        assert_eq!(records[2].id, 3);
        assert_eq!(records[3].time, 15);
        assert!(records.iter().all(|r| (0..=10).contains(&r.count)));
    }

    #[test]
    fn zero_lights_is_empty() {
        let gen = SyntheticTraffic {
            lights: 0,
            ..Default::default()
        };
        assert!(gen.is_empty());
        assert_eq!(gen.records().count(), 0);
    }

    #[test]
    fn seed_makes_output_reproducible() {
        let gen = SyntheticTraffic {
            lights: 5,
            ..Default::default()
        };
        let a: Vec<_> = gen.records().collect();
        let b: Vec<_> = gen.records().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn written_lines_parse_back() {
        let gen = SyntheticTraffic {
            lights: 2,
            max_cars: 50,
            seed: 1,
        };
        let mut buf = Vec::new();
        let written = gen.write_to(&mut buf).unwrap();
        assert_eq!(written as usize, gen.len());

        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("0000 1 "));
        let parsed: Vec<Record> = text.lines().map(|l| l.parse().unwrap()).collect();
        assert_eq!(parsed, gen.records().collect::<Vec<_>>());
    }
}
