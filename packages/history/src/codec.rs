//! # History Codec
//!
//! Persisted form of an [`OperationHistory`]:
//!
//! ```json
//! {
//!   "operationHistory": {
//!     "version": "1.0a",
//!     "encoding": "UTF-8",
//!     "operations": [
//!       { "normalOperation": { "time": 1, "seq": 0, "file": "/a", ... } }
//!     ]
//!   }
//! }
//! ```
//!
//! Text payloads are plain JSON strings, so multi-line content survives a
//! round trip byte-for-byte. Decoding is all-or-nothing.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::CodecError;
use crate::history::OperationHistory;
use crate::operation::Operation;

pub const HISTORY_VERSION: &str = "1.0a";
pub const HISTORY_ENCODING: &str = "UTF-8";

#[derive(Serialize)]
struct DocumentRef<'a> {
    #[serde(rename = "operationHistory")]
    root: RootRef<'a>,
}

#[derive(Serialize)]
struct RootRef<'a> {
    version: &'a str,
    encoding: &'a str,
    operations: &'a [Operation],
}

#[derive(Deserialize)]
struct Document {
    #[serde(rename = "operationHistory")]
    root: Root,
}

#[derive(Deserialize)]
struct Root {
    version: String,
    #[serde(default = "default_encoding")]
    encoding: String,
    #[serde(default)]
    operations: Vec<Operation>,
}

fn default_encoding() -> String {
    HISTORY_ENCODING.to_string()
}

/// Encode a history. Empty histories are refused.
pub fn to_document_string(history: &OperationHistory) -> Result<String, CodecError> {
    if history.is_empty() {
        return Err(CodecError::EmptyHistory);
    }

    let document = DocumentRef {
        root: RootRef {
            version: HISTORY_VERSION,
            encoding: HISTORY_ENCODING,
            operations: history.operations(),
        },
    };

    serde_json::to_string_pretty(&document).map_err(|e| CodecError::Malformed(e.to_string()))
}

/// Decode a history, keeping stored sequence numbers and document order
pub fn from_document_str(text: &str) -> Result<OperationHistory, CodecError> {
    let document: Document =
        serde_json::from_str(text).map_err(|e| CodecError::Malformed(e.to_string()))?;
    let root = document.root;

    if root.version != HISTORY_VERSION {
        return Err(CodecError::UnsupportedVersion(root.version));
    }
    if !root.encoding.eq_ignore_ascii_case(HISTORY_ENCODING) {
        return Err(CodecError::UnsupportedEncoding(root.encoding));
    }

    Ok(OperationHistory::from_operations(root.operations))
}

/// Write a history document to `path`.
///
/// The document is written next to its destination first and renamed into
/// place, so a failed write never leaves a truncated history behind.
pub fn write_history(history: &OperationHistory, path: &Path) -> Result<(), CodecError> {
    let text = to_document_string(history)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let staging = path.with_extension("json.partial");
    fs::write(&staging, text)?;
    if let Err(e) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(e.into());
    }

    debug!(path = %path.display(), operations = history.len(), "wrote history");
    Ok(())
}

/// Read a history document from `path`
pub fn read_history(path: &Path) -> Result<OperationHistory, CodecError> {
    let text = fs::read_to_string(path)?;
    from_document_str(&text).map_err(|e| {
        warn!(path = %path.display(), error = %e, "unreadable history document");
        e
    })
}
