//! # Replay
//!
//! Applies recorded operations to a text buffer, forward or in reverse.
//!
//! Every text edit is validated before it is applied: the span it claims to
//! consume must be present in the buffer verbatim. A failed check returns
//! [`ReplayError::Mismatch`] and the caller's buffer is left untouched.
//! Compounds apply their leaves in order and stop at the first mismatch.

use editlog_common::{char_len, slice_chars, splice};
use tracing::debug;

use crate::errors::ReplayError;
use crate::history::OperationHistory;
use crate::operation::{NormalOperation, Operation};

/// Apply `op` to `buffer`, returning the resulting text
pub fn apply_operation(buffer: &str, op: &Operation) -> Result<String, ReplayError> {
    match op {
        Operation::Normal(normal) => apply_normal(buffer, normal, false),
        Operation::Compound(compound) => compound
            .leaves()
            .into_iter()
            .try_fold(buffer.to_string(), |text, leaf| apply_operation(&text, leaf)),
        _ => Ok(buffer.to_string()),
    }
}

/// Undo `op` on `buffer`, which must be the text right after `op` was applied
pub fn apply_operation_reversely(buffer: &str, op: &Operation) -> Result<String, ReplayError> {
    match op {
        Operation::Normal(normal) => apply_normal(buffer, normal, true),
        Operation::Compound(compound) => compound
            .leaves()
            .into_iter()
            .rev()
            .try_fold(buffer.to_string(), |text, leaf| {
                apply_operation_reversely(&text, leaf)
            }),
        _ => Ok(buffer.to_string()),
    }
}

/// Apply operations left to right
pub fn replay(buffer: &str, ops: &[Operation]) -> Result<String, ReplayError> {
    ops.iter()
        .try_fold(buffer.to_string(), |text, op| apply_operation(&text, op))
}

/// Undo operations right to left, starting from the text after the last one
pub fn replay_reversely(buffer: &str, ops: &[Operation]) -> Result<String, ReplayError> {
    ops.iter()
        .rev()
        .try_fold(buffer.to_string(), |text, op| {
            apply_operation_reversely(&text, op)
        })
}

/// Snapshot of `path` after the first `count` operations related to it
pub fn restore_at(
    history: &OperationHistory,
    path: &str,
    initial: &str,
    count: usize,
) -> Result<String, ReplayError> {
    let related = history.filter_by_path(path);
    let count = count.min(related.len());
    debug!(path, count, "restoring snapshot");
    replay(initial, &related.operations()[..count])
}

fn apply_normal(
    buffer: &str,
    op: &NormalOperation,
    reverse: bool,
) -> Result<String, ReplayError> {
    let (expected, replacement) = if reverse {
        (op.inserted.as_str(), op.deleted.as_str())
    } else {
        (op.deleted.as_str(), op.inserted.as_str())
    };

    let mismatch = |found: String| ReplayError::Mismatch {
        offset: op.offset,
        expected: expected.to_string(),
        found,
    };

    // Past the end nothing can match, not even an empty span
    if op.offset > char_len(buffer) {
        return Err(mismatch(String::new()));
    }

    let expected_len = char_len(expected);
    let found = slice_chars(buffer, op.offset, expected_len)
        .map(str::to_string)
        .unwrap_or_else(|| buffer.chars().skip(op.offset).collect());
    if found != expected {
        return Err(mismatch(found));
    }

    splice(buffer, op.offset, expected_len, replacement).map_err(|_| mismatch(String::new()))
}
