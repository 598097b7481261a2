//! # Macro Compressor
//!
//! Coalesces runs of keystroke-level edits into single macros.
//!
//! ## Rules
//!
//! - **Insert + insert**: fuse when the second starts where the first ended
//! - **Delete + delete**: fuse when contiguous, either backspacing (the new
//!   deletion ends where the previous one started) or forward-deleting
//!   (both start at the same offset)
//! - **Replace after insert/replace**: type-over at the same offset, where
//!   the new macro deletes exactly what the previous one inserted
//!
//! Text containing a delimiter never fuses, so a fused run stays inside one
//! statement or line.

use editlog_common::char_len;
use tracing::trace;

use crate::macros::DocumentMacro;

pub const DEFAULT_DELIMITERS: [char; 5] = ['\n', '\r', ';', '{', '}'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroCompressor {
    delimiters: Vec<char>,
}

impl Default for MacroCompressor {
    fn default() -> Self {
        Self::with_delimiters(DEFAULT_DELIMITERS)
    }
}

impl MacroCompressor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiters(delimiters: impl IntoIterator<Item = char>) -> Self {
        Self {
            delimiters: delimiters.into_iter().collect(),
        }
    }

    pub fn delimiters(&self) -> &[char] {
        &self.delimiters
    }

    /// Whether `text` is free of delimiters
    pub fn combine_with(&self, text: &str) -> bool {
        !text.contains(self.delimiters.as_slice())
    }

    /// Whether `m` may take part in a fused run at all
    pub fn can_combine(&self, m: &DocumentMacro) -> bool {
        if m.is_insert() {
            self.combine_with(&m.inserted)
        } else if m.is_delete() {
            self.combine_with(&m.deleted)
        } else if m.is_replace() {
            self.combine_with(&m.inserted) && self.combine_with(&m.deleted)
        } else {
            false
        }
    }

    /// Fuse `next` onto the pending macro `last`.
    ///
    /// With no pending macro `next` itself becomes pending. `None` means the
    /// two cannot fuse: flush `last` and adopt `next` as the new pending
    /// macro.
    pub fn combine(
        &self,
        last: Option<&DocumentMacro>,
        next: &DocumentMacro,
    ) -> Option<DocumentMacro> {
        let last = match last {
            Some(last) => last,
            None => return Some(next.clone()),
        };

        let fused = if next.is_insert() {
            self.combine_insert(last, next)
        } else if next.is_delete() {
            self.combine_delete(last, next)
        } else if next.is_replace() {
            self.combine_replace(last, next)
        } else {
            None
        };

        if let Some(fused) = &fused {
            trace!(offset = fused.offset, "fused macros");
        }
        fused
    }

    fn combine_insert(&self, last: &DocumentMacro, next: &DocumentMacro) -> Option<DocumentMacro> {
        if !last.is_insert() || !self.combine_with(&last.inserted) {
            return None;
        }

        if last.inserted_end() != next.offset {
            return None;
        }

        let inserted = format!("{}{}", last.inserted, next.inserted);
        Some(fuse(last, next, last.offset, inserted, String::new()))
    }

    fn combine_delete(&self, last: &DocumentMacro, next: &DocumentMacro) -> Option<DocumentMacro> {
        if !last.is_delete() || !self.combine_with(&last.deleted) {
            return None;
        }

        if last.offset > next.offset {
            // Backspace: the new deletion ends where the last one began
            if last.offset != next.offset + char_len(&next.deleted) {
                return None;
            }
            let deleted = format!("{}{}", next.deleted, last.deleted);
            Some(fuse(last, next, next.offset, String::new(), deleted))
        } else {
            // Forward delete keeps the caret in place
            if last.offset != next.offset {
                return None;
            }
            let deleted = format!("{}{}", last.deleted, next.deleted);
            Some(fuse(last, next, last.offset, String::new(), deleted))
        }
    }

    fn combine_replace(
        &self,
        last: &DocumentMacro,
        next: &DocumentMacro,
    ) -> Option<DocumentMacro> {
        if !(last.is_insert() || last.is_replace())
            || !self.combine_with(&last.inserted)
            || !self.combine_with(&last.deleted)
        {
            return None;
        }

        if last.offset != next.offset || last.inserted != next.deleted {
            return None;
        }

        Some(fuse(
            last,
            next,
            last.offset,
            next.inserted.clone(),
            last.deleted.clone(),
        ))
    }
}

/// The fused macro keeps the first macro's kind, path and start time
fn fuse(
    last: &DocumentMacro,
    next: &DocumentMacro,
    offset: usize,
    inserted: String,
    deleted: String,
) -> DocumentMacro {
    DocumentMacro {
        start_time: last.start_time,
        end_time: next.end_time,
        kind: last.kind,
        path: last.path.clone(),
        offset,
        inserted,
        deleted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macros::EditType;
    use editlog_common::Timestamp;

    fn typing(time: Timestamp, offset: usize, ins: &str, del: &str) -> DocumentMacro {
        DocumentMacro::new(time, EditType::Typing, "/a", offset, ins, del)
    }

    #[test]
    fn test_contiguous_inserts_fuse() {
        let compressor = MacroCompressor::new();
        let fused = compressor
            .combine(Some(&typing(1, 0, "a", "")), &typing(2, 1, "b", ""))
            .unwrap();

        assert_eq!(fused.inserted, "ab");
        assert_eq!(fused.offset, 0);
        assert_eq!((fused.start_time, fused.end_time), (1, 2));
    }

    #[test]
    fn test_gap_between_inserts_does_not_fuse() {
        let compressor = MacroCompressor::new();
        assert!(compressor
            .combine(Some(&typing(1, 0, "a", "")), &typing(2, 2, "b", ""))
            .is_none());
    }

    #[test]
    fn test_delimiter_blocks_fusion() {
        let compressor = MacroCompressor::new();
        assert!(!compressor.can_combine(&typing(1, 2, "\n", "")));
        assert!(!compressor.can_combine(&typing(1, 2, "", ";")));
        assert!(!compressor.can_combine(&typing(1, 2, "x", "{")));

        // A pending insert that already holds a delimiter refuses followers
        assert!(compressor
            .combine(Some(&typing(1, 0, "a}", "")), &typing(2, 2, "b", ""))
            .is_none());
    }

    #[test]
    fn test_backspace_run_fuses() {
        let compressor = MacroCompressor::new();
        let fused = compressor
            .combine(Some(&typing(1, 5, "", "c")), &typing(2, 4, "", "b"))
            .unwrap();

        assert_eq!(fused.offset, 4);
        assert_eq!(fused.deleted, "bc");
    }

    #[test]
    fn test_forward_delete_run_fuses() {
        let compressor = MacroCompressor::new();
        let fused = compressor
            .combine(Some(&typing(1, 4, "", "b")), &typing(2, 4, "", "c"))
            .unwrap();

        assert_eq!(fused.offset, 4);
        assert_eq!(fused.deleted, "bc");
    }

    #[test]
    fn test_type_over_fuses() {
        let compressor = MacroCompressor::new();
        let fused = compressor
            .combine(Some(&typing(1, 3, "x", "a")), &typing(2, 3, "y", "x"))
            .unwrap();

        assert_eq!(fused.inserted, "y");
        assert_eq!(fused.deleted, "a");
    }

    #[test]
    fn test_insert_then_delete_does_not_fuse() {
        let compressor = MacroCompressor::new();
        assert!(compressor
            .combine(Some(&typing(1, 0, "a", "")), &typing(2, 0, "", "a"))
            .is_none());
    }

    #[test]
    fn test_no_pending_adopts_next() {
        let compressor = MacroCompressor::new();
        let next = typing(1, 0, "a", "");
        assert_eq!(compressor.combine(None, &next), Some(next));
    }

    #[test]
    fn test_custom_delimiters() {
        let compressor = MacroCompressor::with_delimiters([',']);
        assert!(compressor.can_combine(&typing(1, 0, ";", "")));
        assert!(!compressor.can_combine(&typing(1, 0, ",", "")));
    }
}
