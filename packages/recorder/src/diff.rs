//! # Diff Reconciliation
//!
//! Recovers edits the host never reported by diffing the last known buffer
//! against the current one.
//!
//! The char-level diff is grouped into change blocks separated by unchanged
//! runs. A short unchanged run between two blocks is folded into them when
//! it is cheaper to rewrite it than to keep the blocks apart; the edit cost
//! sets that threshold. Each block becomes one `Diff` macro whose offset is
//! valid in the buffer produced by the blocks before it, so applying the
//! macros left to right turns the old text into the new one.
//!
//! The diff runs under a time limit. Past it the diff degrades to coarser
//! blocks, which still rebuild the new text.

use std::ops::Range;
use std::time::Duration;

use editlog_common::{char_len, slice_chars, splice, Timestamp};
use similar::{Algorithm, DiffTag, TextDiff};
use tracing::{debug, warn};

use crate::macros::{DocumentMacro, EditType};

pub const DEFAULT_EDIT_COST: usize = 4;
pub const DEFAULT_DIFF_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Equal(usize),
    Change {
        old: Range<usize>,
        new: Range<usize>,
    },
}

impl Segment {
    fn change_mut(&mut self) -> Option<(&mut Range<usize>, &mut Range<usize>)> {
        match self {
            Segment::Change { old, new } => Some((old, new)),
            Segment::Equal(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffMacroGenerator {
    edit_cost: usize,
    timeout: Duration,
}

impl Default for DiffMacroGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_EDIT_COST)
    }
}

impl DiffMacroGenerator {
    pub fn new(edit_cost: usize) -> Self {
        Self {
            edit_cost,
            timeout: DEFAULT_DIFF_TIMEOUT,
        }
    }

    /// Bound the time spent diffing one buffer
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn edit_cost(&self) -> usize {
        self.edit_cost
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Macros that turn `old_text` into `new_text`, in application order
    pub fn generate(
        &self,
        time: Timestamp,
        path: &str,
        old_text: &str,
        new_text: &str,
    ) -> Vec<DocumentMacro> {
        if old_text == new_text {
            return Vec::new();
        }

        let old_chars: Vec<char> = old_text.chars().collect();
        let new_chars: Vec<char> = new_text.chars().collect();

        let segments = self.cleanup(diff_segments(old_text, new_text, self.timeout));
        let macros = emit(time, path, &segments, &old_chars, &new_chars);

        if verify(&macros, old_text, new_text) {
            debug!(path, blocks = macros.len(), "reconciled buffer");
            return macros;
        }

        warn!(
            path,
            blocks = macros.len(),
            "diff blocks failed verification, recording whole-buffer replacement"
        );
        vec![DocumentMacro::new(
            time,
            EditType::Diff,
            path,
            0,
            new_text,
            old_text,
        )]
    }

    /// Fold short unchanged runs into the surrounding change blocks
    fn cleanup(&self, segments: Vec<Segment>) -> Vec<Segment> {
        let mut out: Vec<Segment> = Vec::with_capacity(segments.len());

        for segment in segments {
            if let Segment::Change { old, new } = &segment {
                if let Some(merged) = self.absorb(&mut out, old, new) {
                    out.push(merged);
                    continue;
                }
            }
            out.push(segment);
        }

        out
    }

    /// If `out` ends with `change, equal` and the equality is cheap, pop both
    /// and return a single block spanning through `old`/`new`
    fn absorb(
        &self,
        out: &mut Vec<Segment>,
        old: &Range<usize>,
        new: &Range<usize>,
    ) -> Option<Segment> {
        let n = out.len();
        if n < 2 {
            return None;
        }

        let equal_len = match out[n - 1] {
            Segment::Equal(len) => len,
            Segment::Change { .. } => return None,
        };
        let (prev_old, prev_new) = match &out[n - 2] {
            Segment::Change { old, new } => (old.clone(), new.clone()),
            Segment::Equal(_) => return None,
        };

        let sides = [
            !prev_new.is_empty(),
            !prev_old.is_empty(),
            !new.is_empty(),
            !old.is_empty(),
        ]
        .iter()
        .filter(|present| **present)
        .count();

        let cheap = (equal_len < self.edit_cost && sides == 4)
            || (equal_len * 2 < self.edit_cost && sides == 3);
        if !cheap {
            return None;
        }

        out.truncate(n - 2);
        Some(Segment::Change {
            old: prev_old.start..old.end,
            new: prev_new.start..new.end,
        })
    }
}

/// Char-level diff grouped into alternating equal runs and change blocks
fn diff_segments(old_text: &str, new_text: &str, timeout: Duration) -> Vec<Segment> {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .timeout(timeout)
        .diff_chars(old_text, new_text);
    let mut segments: Vec<Segment> = Vec::new();

    for op in diff.ops() {
        let (tag, old, new) = op.as_tag_tuple();
        if tag == DiffTag::Equal {
            segments.push(Segment::Equal(old.len()));
            continue;
        }

        match segments.last_mut().and_then(Segment::change_mut) {
            Some((prev_old, prev_new)) => {
                prev_old.end = old.end;
                prev_new.end = new.end;
            }
            None => segments.push(Segment::Change { old, new }),
        }
    }

    segments
}

fn emit(
    time: Timestamp,
    path: &str,
    segments: &[Segment],
    old_chars: &[char],
    new_chars: &[char],
) -> Vec<DocumentMacro> {
    let mut macros = Vec::new();
    // Position in the partially patched buffer
    let mut cursor = 0;

    for segment in segments {
        match segment {
            Segment::Equal(len) => cursor += len,
            Segment::Change { old, new } => {
                let deleted: String = old_chars[old.clone()].iter().collect();
                let inserted: String = new_chars[new.clone()].iter().collect();
                macros.push(DocumentMacro::new(
                    time,
                    EditType::Diff,
                    path,
                    cursor,
                    inserted,
                    deleted,
                ));
                cursor += new.len();
            }
        }
    }

    macros
}

/// Blocks must be ordered left to right and must rebuild the new text
fn verify(macros: &[DocumentMacro], old_text: &str, new_text: &str) -> bool {
    let ordered = macros.windows(2).all(|w| w[0].offset <= w[1].offset);
    if !ordered {
        return false;
    }

    let mut text = old_text.to_string();
    for m in macros {
        let removed = char_len(&m.deleted);
        if slice_chars(&text, m.offset, removed) != Some(m.deleted.as_str()) {
            return false;
        }
        text = match splice(&text, m.offset, removed, &m.inserted) {
            Ok(text) => text,
            Err(_) => return false,
        };
    }

    text == new_text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply_all(text: &str, macros: &[DocumentMacro]) -> String {
        macros.iter().fold(text.to_string(), |text, m| {
            splice(&text, m.offset, m.deleted.chars().count(), &m.inserted).unwrap()
        })
    }

    #[test]
    fn test_identical_text_yields_nothing() {
        let generator = DiffMacroGenerator::default();
        assert!(generator.generate(0, "/a", "same", "same").is_empty());
    }

    #[test]
    fn test_single_insertion() {
        let generator = DiffMacroGenerator::default();
        let macros = generator.generate(7, "/a", "int x;", "int xy;");

        assert_eq!(macros.len(), 1);
        assert_eq!(macros[0].offset, 5);
        assert_eq!(macros[0].inserted, "y");
        assert_eq!(macros[0].kind, EditType::Diff);
        assert_eq!(macros[0].start_time, 7);
    }

    #[test]
    fn test_offsets_track_patched_text() {
        let generator = DiffMacroGenerator::new(0);
        let old = "aaaa XXXX bbbb YYYY cccc";
        let new = "aaaa ZZ bbbb WWWWWW cccc";
        let macros = generator.generate(0, "/a", old, new);

        assert!(macros.len() >= 2);
        assert_eq!(apply_all(old, &macros), new);
    }

    #[test]
    fn test_edit_cost_merges_close_blocks() {
        let old = "abXcdYef";
        let new = "ab1cd2ef";

        let fine = DiffMacroGenerator::new(0).generate(0, "/a", old, new);
        let coarse = DiffMacroGenerator::new(4).generate(0, "/a", old, new);

        assert_eq!(fine.len(), 2);
        assert_eq!(coarse.len(), 1);
        assert_eq!(coarse[0].deleted, "XcdY");
        assert_eq!(coarse[0].inserted, "1cd2");
        assert_eq!(apply_all(old, &coarse), new);
    }

    #[test]
    fn test_to_and_from_empty() {
        let generator = DiffMacroGenerator::default();

        let created = generator.generate(0, "/a", "", "class A {}\n");
        assert_eq!(apply_all("", &created), "class A {}\n");

        let removed = generator.generate(0, "/a", "class A {}\n", "");
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].deleted, "class A {}\n");
    }

    #[test]
    fn test_multibyte_offsets_are_chars() {
        let generator = DiffMacroGenerator::default();
        let macros = generator.generate(0, "/a", "héllo wörld", "héllo, wörld!");

        assert_eq!(apply_all("héllo wörld", &macros), "héllo, wörld!");
    }

    #[test]
    fn test_timeout_still_rebuilds_text() {
        let old: String = (0..4000).map(|i| char::from(b'a' + (i * 7 % 26) as u8)).collect();
        let new: String = (0..4000).map(|i| char::from(b'a' + (i * 11 % 26) as u8)).collect();

        let generator = DiffMacroGenerator::default().with_timeout(Duration::ZERO);
        assert_eq!(generator.timeout(), Duration::ZERO);

        let macros = generator.generate(0, "/a", &old, &new);
        assert!(!macros.is_empty());
        assert_eq!(apply_all(&old, &macros), new);
    }
}
