//! Operations and their textual trace records.
//!
//! Every record is one line of the form `<OP> <KEY> <VALUE>`, where `OP` is `I` for insert-class
//! operations (fresh inserts and updates) and `L` for lookups (hits and misses). Keys and values
//! are decimal unsigned 64-bit integers.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::population::Item;

/// The operation tag written to a trace.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum OpKind {
    /// `I`: insert the value under the key, overwriting any existing value.
    Insert,
    /// `L`: look up the key and compare against the value.
    Lookup,
}

impl OpKind {
    /// The single-character tag of this kind.
    pub fn tag(self) -> char {
        match self {
            OpKind::Insert => 'I',
            OpKind::Lookup => 'L',
        }
    }
}

/// One line of a trace.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Record {
    /// The operation tag.
    pub op: OpKind,
    /// The key the operation targets.
    pub key: u64,
    /// The value written, or expected for lookups.
    pub value: u64,
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.op.tag(), self.key, self.value)
    }
}

/// Errors when parsing a [`Record`] from a trace line.
#[derive(Debug, Error, PartialEq)]
pub enum RecordParseError {
    /// The tag is neither `I` nor `L`.
    #[error("unknown operation tag {0:?}")]
    UnknownOp(String),

    /// The line does not have exactly three fields.
    #[error("expected 3 space-separated fields, found {0}")]
    FieldCount(usize),

    /// A key or value is not a decimal `u64`.
    #[error("invalid {field}: {source}")]
    InvalidNumber {
        /// Which field failed to parse.
        field: &'static str,
        /// The underlying parse error.
        source: std::num::ParseIntError,
    },
}

impl FromStr for Record {
    type Err = RecordParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.split(' ').collect();
        let &[op, key, value] = fields.as_slice() else {
            return Err(RecordParseError::FieldCount(fields.len()));
        };

        let op = match op {
            "I" => OpKind::Insert,
            "L" => OpKind::Lookup,
            other => return Err(RecordParseError::UnknownOp(other.to_owned())),
        };
        let number = |field: &'static str, text: &str| -> Result<u64, RecordParseError> {
            text.parse()
                .map_err(|source| RecordParseError::InvalidNumber { field, source })
        };

        Ok(Record {
            op,
            key: number("key", key)?,
            value: number("value", value)?,
        })
    }
}

/// A generated operation, before it is flattened into a [`Record`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Operation {
    /// Inserts a key that has never been seen in this run.
    FreshInsert(Item),
    /// Overwrites the value of a previously inserted key.
    Update(Item),
    /// Looks up a key that is known to exist, expecting its current value.
    HitLookup(Item),
    /// Looks up a key that is known to be absent. The value carries no meaning.
    MissLookup(Item),
}

impl Operation {
    /// The item carried by this operation.
    pub fn item(&self) -> Item {
        match *self {
            Operation::FreshInsert(item)
            | Operation::Update(item)
            | Operation::HitLookup(item)
            | Operation::MissLookup(item) => item,
        }
    }

    /// The tag under which this operation is written.
    pub fn kind(&self) -> OpKind {
        match self {
            Operation::FreshInsert(_) | Operation::Update(_) => OpKind::Insert,
            Operation::HitLookup(_) | Operation::MissLookup(_) => OpKind::Lookup,
        }
    }

    /// The trace record for this operation.
    pub fn record(&self) -> Record {
        let Item { key, value } = self.item();
        Record {
            op: self.kind(),
            key,
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_records() {
        let record = Record {
            op: OpKind::Insert,
            key: 42,
            value: u64::MAX - 2,
        };
        assert_eq!(record.to_string(), "I 42 18446744073709551613");

        let lookup = Operation::MissLookup(Item { key: 7, value: 0 }).record();
        assert_eq!(lookup.to_string(), "L 7 0");
    }

    #[test]
    fn parses_records() {
        let record: Record = "L 18446744073709551615 3".parse().unwrap();
        assert_eq!(
            record,
            Record {
                op: OpKind::Lookup,
                key: u64::MAX,
                value: 3,
            }
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!(
            "X 1 2".parse::<Record>(),
            Err(RecordParseError::UnknownOp("X".into()))
        );
        assert_eq!(
            "I 1".parse::<Record>(),
            Err(RecordParseError::FieldCount(2))
        );
        assert_eq!(
            "I 1  2".parse::<Record>(),
            Err(RecordParseError::FieldCount(4))
        );
        assert!(matches!(
            "I -1 2".parse::<Record>(),
            Err(RecordParseError::InvalidNumber { field: "key", .. })
        ));
        assert!(matches!(
            "I 1 18446744073709551616".parse::<Record>(),
            Err(RecordParseError::InvalidNumber { field: "value", .. })
        ));
    }

    #[test]
    fn updates_and_inserts_share_a_tag() {
        let item = Item { key: 1, value: 2 };
        assert_eq!(Operation::FreshInsert(item).kind(), OpKind::Insert);
        assert_eq!(Operation::Update(item).kind(), OpKind::Insert);
        assert_eq!(Operation::HitLookup(item).kind(), OpKind::Lookup);
    }
}
