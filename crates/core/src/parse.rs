//! Data-file line format: `time id count`, whitespace separated.

use std::num::ParseIntError;
use std::str::FromStr;

use crate::Record;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseRecordError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` is not an integer: {source}")]
    InvalidField {
        field: &'static str,
        #[source]
        source: ParseIntError,
    },
    #[error("unexpected trailing field `{0}`")]
    TrailingField(String),
    #[error("line is not valid UTF-8")]
    InvalidUtf8,
}

const FIELDS: [&str; 3] = ["time", "id", "count"];

impl FromStr for Record {
    type Err = ParseRecordError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let mut values = [0i64; 3];
        for (slot, field) in values.iter_mut().zip(FIELDS) {
            let raw = parts.next().ok_or(ParseRecordError::MissingField(field))?;
            *slot = raw
                .parse()
                .map_err(|source| ParseRecordError::InvalidField { field, source })?;
        }
        if let Some(extra) = parts.next() {
            return Err(ParseRecordError::TrailingField(extra.to_string()));
        }
        let [time, id, count] = values;
        Ok(Record { time, id, count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_integers() {
        let rec: Record = "0815 42 99871".parse().unwrap();
        assert_eq!(rec, Record::new(815, 42, 99871));
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        let rec: Record = "  1030\t2   9 \r".parse().unwrap();
        assert_eq!(rec, Record::new(1030, 2, 9));
    }

    #[test]
    fn rejects_short_line() {
        let err = "1030 2".parse::<Record>().unwrap_err();
        assert_eq!(err, ParseRecordError::MissingField("count"));
    }

    #[test]
    fn rejects_non_integer() {
        let err = "1030 two 9".parse::<Record>().unwrap_err();
        assert!(matches!(err, ParseRecordError::InvalidField { field: "id", .. }));
    }

    #[test]
    fn rejects_extra_fields() {
        let err = "1030 2 9 7".parse::<Record>().unwrap_err();
        assert_eq!(err, ParseRecordError::TrailingField("7".into()));
    }
}
