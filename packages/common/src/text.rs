//! Char-offset text helpers.
//!
//! Recorded offsets count Unicode scalar values, not bytes, so every buffer
//! access goes through these helpers instead of slicing `str` directly.

use crate::error::CommonError;
use crate::result::CommonResult;

const ABBREVIATED_LEN: usize = 10;

/// Number of chars in `text`
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte index of the char at `offset`, or `text.len()` when `offset` is the end
pub fn byte_index(text: &str, offset: usize) -> Option<usize> {
    if offset == 0 {
        return Some(0);
    }

    let mut count = 0;
    for (idx, _) in text.char_indices() {
        if count == offset {
            return Some(idx);
        }
        count += 1;
    }

    if count == offset {
        Some(text.len())
    } else {
        None
    }
}

/// The `len` chars of `text` starting at char `offset`, if they exist
pub fn slice_chars(text: &str, offset: usize, len: usize) -> Option<&str> {
    let start = byte_index(text, offset)?;
    let end = start + byte_index(&text[start..], len)?;
    Some(&text[start..end])
}

/// Replace `removed` chars at char `offset` with `insert`
pub fn splice(text: &str, offset: usize, removed: usize, insert: &str) -> CommonResult<String> {
    let out_of_range = |offset| CommonError::OffsetOutOfRange {
        offset,
        len: char_len(text),
    };

    let start = byte_index(text, offset).ok_or_else(|| out_of_range(offset))?;
    let end = start
        + byte_index(&text[start..], removed).ok_or_else(|| out_of_range(offset + removed))?;

    let mut result = String::with_capacity(text.len() - (end - start) + insert.len());
    result.push_str(&text[..start]);
    result.push_str(insert);
    result.push_str(&text[end..]);
    Ok(result)
}

/// Short single-line rendering of a text payload for listings
pub fn abbreviate(text: &str) -> String {
    let short = if char_len(text) <= ABBREVIATED_LEN {
        text.to_string()
    } else {
        let head: String = text.chars().take(ABBREVIATED_LEN).collect();
        format!("{}...", head)
    };
    short.replace('\n', "~")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_index_multibyte() {
        let text = "aé€b";
        assert_eq!(byte_index(text, 0), Some(0));
        assert_eq!(byte_index(text, 1), Some(1));
        assert_eq!(byte_index(text, 2), Some(3));
        assert_eq!(byte_index(text, 3), Some(6));
        assert_eq!(byte_index(text, 4), Some(7));
        assert_eq!(byte_index(text, 5), None);
    }

    #[test]
    fn test_slice_chars() {
        assert_eq!(slice_chars("héllo", 1, 3), Some("éll"));
        assert_eq!(slice_chars("héllo", 5, 0), Some(""));
        assert_eq!(slice_chars("héllo", 3, 5), None);
    }

    #[test]
    fn test_splice_replaces_by_char_offset() {
        assert_eq!(splice("héllo", 1, 1, "e").unwrap(), "hello");
        assert_eq!(splice("abc", 3, 0, "d").unwrap(), "abcd");
        assert_eq!(splice("abc", 0, 3, "").unwrap(), "");
    }

    #[test]
    fn test_splice_out_of_range() {
        let err = splice("abc", 4, 0, "x").unwrap_err();
        assert!(matches!(err, CommonError::OffsetOutOfRange { offset: 4, len: 3 }));

        let err = splice("abc", 2, 5, "").unwrap_err();
        assert!(matches!(err, CommonError::OffsetOutOfRange { offset: 7, len: 3 }));
    }

    #[test]
    fn test_abbreviate() {
        assert_eq!(abbreviate("a\nb"), "a~b");
        assert_eq!(abbreviate("0123456789"), "0123456789");
        assert_eq!(abbreviate("0123456789abc"), "0123456789...");
    }
}
