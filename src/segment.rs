//! Phrase segmentation — splits normalized text into alternating
//! phrase/punctuation fragments ahead of phonemization.
//!
//! The splitter walks the text once, cutting at every character of a fixed
//! punctuation class.  Each cut records the punctuation mark that caused it,
//! but only when the fragment before the mark trims to something non-empty:
//! a mark with nothing to attach to (leading punctuation, runs of consecutive
//! marks) is discarded together with its empty fragment.
//!
//! Consequences worth keeping in mind:
//! - `punctuations[i]` is the mark that immediately followed `phrases[i]`.
//! - `phrases` is at most one element longer than `punctuations` (a trailing
//!   phrase may lack punctuation; punctuation never exists without a phrase).
//! - Input consisting only of punctuation yields two empty vectors.

use once_cell::sync::Lazy;
use regex::Regex;

/// The punctuation class that terminates a phrase:
/// `; : , . ! ? ¡ ¿ — … " « » " " ( ) { } [ ]`
static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[;:,.!?¡¿—…"«»“”(){}\[\]]"#).unwrap());

/// Split `text` into whitespace-trimmed phrases and the punctuation marks
/// that followed them.
pub fn split_phrases(text: &str) -> (Vec<String>, Vec<String>) {
    let mut phrases = Vec::new();
    let mut punctuations = Vec::new();

    let mut last = 0;
    for m in PUNCTUATION.find_iter(text) {
        let fragment = text[last..m.start()].trim();
        if !fragment.is_empty() {
            phrases.push(fragment.to_string());
            punctuations.push(m.as_str().to_string());
        }
        last = m.end();
    }

    let tail = text[last..].trim();
    if !tail.is_empty() {
        phrases.push(tail.to_string());
    }

    (phrases, punctuations)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
