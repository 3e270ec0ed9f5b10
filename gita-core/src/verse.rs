//! Marker-based verse extraction from streamed response text.
//!
//! The generation endpoint answers with free text in which each verse is
//! prefixed with the marker token. Records are re-derived from the full
//! accumulated text on every update rather than parsed incrementally, so the
//! record list is always a pure function of the text seen so far.

use crate::prompt::VERSE_MARKER;
use serde::{Deserialize, Serialize};

/// A verse extracted from response text.
///
/// `verse` holds the marker line itself; `answer` holds the line immediately
/// after it. `answer` is `None` while the marker is the last line the stream
/// has produced so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseRecord {
    pub verse: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

/// Extracts verse records from accumulated response text.
///
/// Splits on `'\n'` and pairs every line starting with [`VERSE_MARKER`] with
/// the line at the next index. Two consecutive marker lines therefore pair
/// the first marker with the second marker's text as its answer; that is the
/// contract of the line-pairing heuristic, kept as-is.
pub fn parse_verses(text: &str) -> Vec<VerseRecord> {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut records = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        if line.starts_with(VERSE_MARKER) {
            records.push(VerseRecord {
                verse: (*line).to_string(),
                answer: lines.get(index + 1).map(|next| (*next).to_string()),
            });
        }
    }

    records
}
