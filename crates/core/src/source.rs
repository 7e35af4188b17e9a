//! Record sources: sequential feeds that yield one record per read.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::{CoreError, ParseRecordError, Record};

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("line {line}: {source}")]
    Malformed {
        line: u64,
        #[source]
        source: ParseRecordError,
    },
    #[error("read failed: {0}")]
    Io(#[from] io::Error),
}

/// A sequential feed of records.
///
/// `Ok(None)` signals exhaustion; implementations stay exhausted afterwards.
/// A `Malformed` error consumes the offending entry, so the next call moves on.
pub trait RecordSource: Send {
    fn next_record(&mut self) -> Result<Option<Record>, SourceError>;
}

impl<S: RecordSource + ?Sized> RecordSource for Box<S> {
    fn next_record(&mut self) -> Result<Option<Record>, SourceError> {
        (**self).next_record()
    }
}

/// Reads `time id count` lines from any buffered reader. Blank lines are skipped.
pub struct LineSource<R> {
    reader: R,
    buf: Vec<u8>,
    line: u64,
    done: bool,
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line: 0,
            done: false,
        }
    }

    /// Number of lines consumed so far.
    pub fn lines_read(&self) -> u64 {
        self.line
    }
}

impl LineSource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| CoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "opened data file");
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead + Send> RecordSource for LineSource<R> {
    fn next_record(&mut self) -> Result<Option<Record>, SourceError> {
        while !self.done {
            self.buf.clear();
            let n = match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(n) => n,
                Err(err) => {
                    self.done = true;
                    return Err(err.into());
                }
            };
            if n == 0 {
                self.done = true;
                break;
            }
            self.line += 1;
            let line = self.line;
            let malformed = |source| SourceError::Malformed { line, source };
            let text = std::str::from_utf8(&self.buf)
                .map_err(|_| malformed(ParseRecordError::InvalidUtf8))?
                .trim();
            if text.is_empty() {
                continue;
            }
            return text.parse().map(Some).map_err(malformed);
        }
        Ok(None)
    }
}

/// In-memory source, handy for callers that already hold their records.
#[derive(Debug, Default, Clone)]
pub struct VecSource {
    records: VecDeque<Record>,
}

impl VecSource {
    pub fn new(records: impl IntoIterator<Item = Record>) -> Self {
        Self {
            records: records.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.records.len()
    }
}

impl RecordSource for VecSource {
    fn next_record(&mut self) -> Result<Option<Record>, SourceError> {
        Ok(self.records.pop_front())
    }
}
