//! Folding of line-delimited `add` replies into one record per file.
//!
//! The daemon answers an upload with one JSON object per line, and may report
//! the same file more than once (a progress line with `Bytes`, then a final
//! line with `Hash`):
//!
//! ```text
//! {"Name":"foo.txt","Bytes":4}
//! {"Name":"foo.txt","Hash":"QmWPyMW2u7J2Zyzut7TcBMT8pG6F2cB4hmZk1vBJFBt1nP"}
//! ```
//!
//! [`AddReplyAggregator`] merges such lines by `Name` and keeps files in the
//! order they were first seen.
//!
//! Records are typed: a `Hash` that is not a string or a `Bytes` that is not a
//! non-negative integer makes the line malformed, the same as invalid JSON or
//! a missing `Name`. Other fields are ignored.

use crate::errors::{IpfsError, IpfsResult};
use crate::types::AddedFile;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::io::BufRead;

/// Identity field correlating lines that describe the same file.
pub const IDENTITY_FIELD: &str = "Name";

const HASH_FIELD: &str = "Hash";
const BYTES_FIELD: &str = "Bytes";

/// Incremental aggregator over reply lines.
#[derive(Debug, Default)]
pub struct AddReplyAggregator {
    records: Vec<AddedFile>,
    index: HashMap<String, usize>,
    line: usize,
}

impl AddReplyAggregator {
    /// Creates an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of lines consumed so far, blank ones included.
    pub fn lines_seen(&self) -> usize {
        self.line
    }

    /// Consumes one line. Blank lines are counted and skipped.
    pub fn push_line(&mut self, raw: &str) -> IpfsResult<()> {
        self.line += 1;
        let line = self.line;

        if raw.trim().is_empty() {
            return Ok(());
        }

        let object: Map<String, Value> = serde_json::from_str(raw)
            .map_err(|e| IpfsError::malformed_line(line, raw, e.to_string()))?;

        let name = match object.get(IDENTITY_FIELD) {
            Some(Value::String(name)) => name.clone(),
            Some(_) => {
                return Err(IpfsError::malformed_line(
                    line,
                    raw,
                    format!("\"{}\" is not a string", IDENTITY_FIELD),
                ))
            }
            None => {
                return Err(IpfsError::malformed_line(
                    line,
                    raw,
                    format!("missing the \"{}\" property", IDENTITY_FIELD),
                ))
            }
        };

        let slot = match self.index.get(&name) {
            Some(&slot) => slot,
            None => {
                self.records.push(AddedFile::new(name.clone()));
                self.index.insert(name, self.records.len() - 1);
                self.records.len() - 1
            }
        };
        let record = &mut self.records[slot];

        if let Some(hash) = object.get(HASH_FIELD) {
            let hash = hash.as_str().ok_or_else(|| {
                IpfsError::malformed_line(line, raw, format!("\"{}\" is not a string", HASH_FIELD))
            })?;
            record.hash = Some(hash.to_string());
        }

        if let Some(bytes) = object.get(BYTES_FIELD) {
            let bytes = bytes.as_u64().ok_or_else(|| {
                IpfsError::malformed_line(
                    line,
                    raw,
                    format!("\"{}\" is not a non-negative integer", BYTES_FIELD),
                )
            })?;
            record.size = Some(bytes);
        }

        Ok(())
    }

    /// Returns one record per distinct file, in first-seen order.
    pub fn finish(self) -> Vec<AddedFile> {
        self.records
    }
}

/// Aggregates a whole reply read line by line from `reader`.
///
/// A final line without a trailing newline is still parsed. An empty reply
/// yields no records.
pub fn aggregate_add_reply<R: BufRead>(reader: R) -> IpfsResult<Vec<AddedFile>> {
    let mut aggregator = AddReplyAggregator::new();
    for line in reader.lines() {
        let line = line.map_err(|e| IpfsError::io(format!("failed to read reply: {}", e)))?;
        aggregator.push_line(&line)?;
    }
    Ok(aggregator.finish())
}
