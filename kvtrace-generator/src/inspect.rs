//! Reading traces back and replaying them against a model table.
//!
//! [`TraceSummary`] parses a trace and replays it against a plain `HashMap`, counting what a
//! correct table implementation would observe: how many lookups find their key, and how many of
//! those return a value different from the one recorded in the trace. A trace generated with
//! only hit lookups therefore has no failed matches and no missed lookups after its first insert.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

use crate::record::{OpKind, Record, RecordParseError};

/// Errors while inspecting a trace.
#[derive(Debug, Error)]
pub enum InspectError {
    /// Reading the trace failed.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A line is not a valid record.
    #[error("line {line}: {source}")]
    Parse {
        /// The 1-based line number.
        line: u64,
        /// Why the line is invalid.
        source: RecordParseError,
    },
}

/// Counters collected by replaying a trace.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TraceSummary {
    /// Total number of records.
    pub total_ops: u64,
    /// Number of `I` records.
    pub inserts: u64,
    /// Number of `L` records.
    pub lookups: u64,
    /// Lookups whose key was present in the model.
    pub successful_lookups: u64,
    /// Lookups whose key was absent from the model.
    pub missed_lookups: u64,
    /// Successful lookups whose recorded value differs from the model.
    pub failed_matches: u64,
    /// Number of distinct keys inserted.
    pub distinct_keys: u64,
}

impl TraceSummary {
    /// Replays the trace at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, InspectError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Replays a trace read line by line from `reader`.
    pub fn from_reader(reader: impl BufRead) -> Result<Self, InspectError> {
        let mut model = HashMap::new();
        let mut summary = TraceSummary::default();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let record: Record = line.parse().map_err(|source| InspectError::Parse {
                line: index as u64 + 1,
                source,
            })?;
            summary.replay(&mut model, record);
        }

        summary.distinct_keys = model.len() as u64;
        Ok(summary)
    }

    fn replay(&mut self, model: &mut HashMap<u64, u64>, record: Record) {
        self.total_ops += 1;

        match record.op {
            OpKind::Insert => {
                self.inserts += 1;
                model.insert(record.key, record.value);
            }
            OpKind::Lookup => {
                self.lookups += 1;
                match model.get(&record.key) {
                    Some(&value) => {
                        self.successful_lookups += 1;
                        if value != record.value {
                            self.failed_matches += 1;
                        }
                    }
                    None => self.missed_lookups += 1,
                }
            }
        }
    }
}
