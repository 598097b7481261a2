//! # Operation History
//!
//! Ordered collection of finalized operations for one recording session.
//!
//! Operations are totally ordered by `(time, seq)`. The history hands out
//! sequence numbers itself: the first operation appended at a given
//! millisecond gets seq 0, the next one seq 1 and so on, so callers never
//! have to coordinate tie-breaks.

use std::collections::HashMap;
use std::fmt;

use editlog_common::Timestamp;
use tracing::debug;

use crate::operation::{FileAction, Operation};

#[derive(Debug, Clone, Default)]
pub struct OperationHistory {
    operations: Vec<Operation>,
    /// Next sequence number per timestamp
    next_seq: HashMap<Timestamp, u32>,
}

impl OperationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a history from operations that already carry sequence
    /// numbers (e.g. decoded from a document). Appending afterwards keeps
    /// numbering past the highest stored seq of each timestamp.
    pub fn from_operations(operations: Vec<Operation>) -> Self {
        let mut next_seq: HashMap<Timestamp, u32> = HashMap::new();
        for op in &operations {
            let next = next_seq.entry(op.time()).or_insert(0);
            *next = (*next).max(op.seq() + 1);
        }
        Self {
            operations,
            next_seq,
        }
    }

    /// Append an operation, assigning its sequence number. Returns the seq.
    pub fn append(&mut self, mut op: Operation) -> u32 {
        let next = self.next_seq.entry(op.time()).or_insert(0);
        let seq = *next;
        *next += 1;

        op.set_seq(seq);
        debug!(time = op.time(), seq, path = %op.path(), "append operation");
        self.operations.push(op);
        seq
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Operation> {
        self.operations.get(index)
    }

    pub fn first(&self) -> Option<&Operation> {
        self.operations.first()
    }

    pub fn last(&self) -> Option<&Operation> {
        self.operations.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn into_operations(self) -> Vec<Operation> {
        self.operations
    }

    /// Stable sort by `(time, seq)`
    pub fn sort(&mut self) {
        self.operations.sort_by_key(|op| (op.time(), op.seq()));
    }

    /// New history holding only operations related to `path`. Compounds are
    /// kept whole when any of their leaves touches the path.
    pub fn filter_by_path(&self, path: &str) -> OperationHistory {
        let related = self
            .operations
            .iter()
            .filter(|op| op.is_related_to(path))
            .cloned()
            .collect();
        OperationHistory::from_operations(related)
    }

    /// Drop every operation related to `path`
    pub fn remove_path(&mut self, path: &str) {
        self.operations.retain(|op| !op.is_related_to(path));
    }

    /// Append all operations of `other`. Each is re-sequenced so the merged
    /// history keeps a strict `(time, seq)` order.
    pub fn merge(&mut self, other: OperationHistory) {
        let mut incoming = other.operations;
        incoming.sort_by_key(|op| (op.time(), op.seq()));
        for op in incoming {
            self.append(op);
        }
    }

    pub fn clear(&mut self) {
        self.operations.clear();
        self.next_seq.clear();
    }

    /// A session that only opened and closed a file without touching its
    /// text is not worth persisting.
    pub fn should_write(&self) -> bool {
        if self.operations.is_empty() {
            return false;
        }

        let first = self.operations.first().and_then(Operation::as_file);
        let last = self.operations.last().and_then(Operation::as_file);
        let (first, last) = match (first, last) {
            (Some(first), Some(last)) => (first, last),
            _ => return true,
        };

        let opens_and_closes =
            first.action == FileAction::Open && last.action == FileAction::Close;
        if !opens_and_closes || first.path != last.path || first.code != last.code {
            return true;
        }

        self.operations.iter().any(Operation::is_text_edit)
    }
}

impl PartialEq for OperationHistory {
    fn eq(&self, other: &Self) -> bool {
        self.operations == other.operations
    }
}

impl Eq for OperationHistory {}

impl<'a> IntoIterator for &'a OperationHistory {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

impl fmt::Display for OperationHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const FRAME: &str = "+--------------------------------------------------+";
        writeln!(f, "{}", FRAME)?;
        for op in &self.operations {
            writeln!(f, "{}", op)?;
        }
        write!(f, "{}", FRAME)
    }
}
