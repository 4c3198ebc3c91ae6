//! Symbol-level tokenisation — maps normalized phoneme strings, punctuation
//! and spaces to the integer ids the model consumes.
//!
//! The vocabulary is loaded once from a JSON object (`vocab.json`: symbol →
//! id) and is immutable afterwards.  Id 0 doubles as the sentence boundary
//! sentinel and, under the legacy policy, as the id for symbols missing from
//! the vocabulary; see [`UnknownSymbol`].

use std::{collections::HashMap, path::Path};

use anyhow::{Context, Result};
use tracing::debug;

use crate::{error::KokoroError, phonemize::Phonemizer, rules::PhonemeRules, segment};

/// Sentence start/end sentinel.  Also the legacy fallback id for symbols
/// absent from the vocabulary — the two meanings are indistinguishable in the
/// encoded sequence, which is why the fallback is a policy, not a default of
/// the lookup itself.
pub const BOUNDARY_ID: i64 = 0;

// ─────────────────────────────────────────────────────────────────────────────
// Grapheme splitter
// ─────────────────────────────────────────────────────────────────────────────

/// Split `text` into atomic symbol units by leading-byte pattern.
///
/// The unit length is decided solely by the top bits of each leading byte
/// (1 byte for `0xxxxxxx`, 2 for `110xxxxx`, 3 for `1110xxxx`, 4 for
/// `11110xxx`).  This is intentionally NOT grapheme-cluster segmentation: a
/// base character followed by a combining mark becomes two units unless the
/// rule engine removed the mark upstream.  Vocabulary keys are defined
/// against exactly these boundaries, so the behaviour must not be "fixed".
///
/// Concatenating the returned units reproduces `text` exactly.
pub fn split_symbols(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut units = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        let len = if b & 0xe0 == 0xc0 {
            2
        } else if b & 0xf0 == 0xe0 {
            3
        } else if b & 0xf8 == 0xf0 {
            4
        } else {
            1
        };
        let end = (i + len).min(bytes.len());
        units.push(&text[i..end]);
        i = end;
    }
    units
}

// ─────────────────────────────────────────────────────────────────────────────
// Vocabulary
// ─────────────────────────────────────────────────────────────────────────────

/// Symbol → id table, loaded once at startup.
pub struct Vocabulary {
    map: HashMap<String, i64>,
}

impl Vocabulary {
    /// Load the vocabulary from a JSON object file.  Failure is fatal.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Cannot read vocabulary: {}", path.display()))?;
        let map: HashMap<String, i64> = serde_json::from_slice(&bytes)
            .with_context(|| format!("Malformed vocabulary: {}", path.display()))?;
        Ok(Self { map })
    }

    pub fn from_map(map: HashMap<String, i64>) -> Self {
        Self { map }
    }

    /// Explicit lookup — `None` for symbols not in the table.  The choice of
    /// what to do with unknowns belongs to the caller, not to the container.
    pub fn id(&self, symbol: &str) -> Option<i64> {
        self.map.get(symbol).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Encoder
// ─────────────────────────────────────────────────────────────────────────────

/// What to do when a symbol has no vocabulary entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownSymbol {
    /// Map to [`BOUNDARY_ID`].  This is the legacy behaviour of the original
    /// implementation; note that it makes an unknown symbol indistinguishable
    /// from a sentence boundary.
    #[default]
    Boundary,
    /// Fail with [`KokoroError::UnknownSymbol`].
    Reject,
}

/// Composes segmentation, phonemization, normalization and vocabulary lookup
/// into one bounded token sequence.
pub struct Encoder<'a> {
    vocab: &'a Vocabulary,
    rules: &'a PhonemeRules,
    unknown: UnknownSymbol,
}

impl<'a> Encoder<'a> {
    pub fn new(vocab: &'a Vocabulary, rules: &'a PhonemeRules) -> Self {
        Self { vocab, rules, unknown: UnknownSymbol::default() }
    }

    pub fn with_unknown_policy(mut self, unknown: UnknownSymbol) -> Self {
        self.unknown = unknown;
        self
    }

    /// Encode `text` into a token sequence wrapped with boundary sentinels.
    ///
    /// Case folding happens once, here, before segmentation.  Each phrase is
    /// phonemized, normalized and split into atomic units; a phrase whose
    /// phoneme output is empty contributes nothing and processing continues.
    /// After each phrase with a recorded punctuation mark, the mark's id and
    /// the space id are appended.
    pub fn encode(&self, text: &str, phonemizer: &dyn Phonemizer) -> Result<Vec<i64>> {
        let text = text.to_lowercase();
        let (phrases, punctuations) = segment::split_phrases(&text);

        let mut ids = vec![BOUNDARY_ID];
        for (i, phrase) in phrases.iter().enumerate() {
            let raw = phonemizer.phonemize(phrase)?;
            let raw = raw.trim();
            if !raw.is_empty() {
                let normalized = self.rules.apply(raw);
                for unit in split_symbols(&normalized) {
                    ids.push(self.lookup(unit)?);
                }
            }
            if let Some(punctuation) = punctuations.get(i) {
                ids.push(self.lookup(punctuation)?);
                ids.push(self.lookup(" ")?);
            }
        }
        ids.push(BOUNDARY_ID);

        debug!(text = %text, ids = ?ids, "encoded token sequence");
        Ok(ids)
    }

    fn lookup(&self, symbol: &str) -> Result<i64> {
        match self.vocab.id(symbol) {
            Some(id) => Ok(id),
            None => match self.unknown {
                UnknownSymbol::Boundary => Ok(BOUNDARY_ID),
                UnknownSymbol::Reject => {
                    Err(KokoroError::UnknownSymbol { symbol: symbol.to_string() }.into())
                }
            },
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Fixture oracle: word → separator-joined phonemes, espeak-style.
    struct TablePhonemizer(HashMap<&'static str, &'static str>);

    impl TablePhonemizer {
        fn new() -> Self {
            let mut m = HashMap::new();
            m.insert("hello", "h_ə_l_ˈoʊ");
            m.insert("world", "w_ˈɜː_l_d");
            m.insert("silence", "");
            Self(m)
        }
    }

    impl Phonemizer for TablePhonemizer {
        fn phonemize(&self, text: &str) -> Result<String> {
            Ok(self.0.get(text).copied().unwrap_or("").to_string())
        }
    }

    fn test_vocab() -> Vocabulary {
        let symbols = [
            (" ", 1),
            (",", 2),
            (".", 3),
            ("h", 10),
            ("ə", 11),
            ("l", 12),
            ("O", 13),
            ("w", 14),
            ("ɜ", 15),
            ("ɹ", 16),
            ("d", 17),
            ("ˈ", 18),
        ];
        Vocabulary::from_map(
            symbols.iter().map(|&(s, id)| (s.to_string(), id)).collect(),
        )
    }

    #[test]
    fn test_split_symbols_lengths() {
        assert_eq!(split_symbols("abc"), vec!["a", "b", "c"]);
        assert_eq!(split_symbols("ə"), vec!["ə"]); // 2-byte
        assert_eq!(split_symbols("ᵊ"), vec!["ᵊ"]); // 3-byte
        assert_eq!(split_symbols("𝄞"), vec!["𝄞"]); // 4-byte
        assert_eq!(split_symbols(""), Vec::<&str>::new());
    }

    #[test]
    fn test_split_symbols_combining_mark_is_separate_unit() {
        // Naive byte-length splitting: base char and combining mark are two
        // units, not one grapheme cluster.
        assert_eq!(split_symbols("n\u{0329}"), vec!["n", "\u{0329}"]);
    }

    #[test]
    fn test_split_symbols_concat_preserving() {
        let inputs = ["həlO wɜɹld", "a,b.c", "ʔˌn\u{0329}", ""];
        for input in inputs {
            assert_eq!(split_symbols(input).concat(), input);
        }
    }

    #[test]
    fn test_vocabulary_lookup_is_explicit() {
        let vocab = test_vocab();
        assert_eq!(vocab.id("h"), Some(10));
        assert_eq!(vocab.id("ℵ"), None);
    }

    #[test]
    fn test_encode_hello_world() {
        let vocab = test_vocab();
        let rules = PhonemeRules::new();
        let encoder = Encoder::new(&vocab, &rules);
        let phonemizer = TablePhonemizer::new();

        let ids = encoder.encode("Hello, world.", &phonemizer).unwrap();

        // hello → həlO; world → wɜɹld (ɜː folded by the rule engine)
        let expected = vec![
            BOUNDARY_ID,
            10, 11, 12, 18, 13, // h ə l ˈ O
            2, 1, // , ␣
            14, 18, 15, 16, 12, 17, // w ˈ ɜ ɹ l d
            3, 1, // . ␣
            BOUNDARY_ID,
        ];
        assert_eq!(ids, expected);

        // Boundary wrap and the count invariant.
        assert_eq!(ids[0], BOUNDARY_ID);
        assert_eq!(*ids.last().unwrap(), BOUNDARY_ID);
        assert_eq!(ids.len() - 2, 15);
    }

    #[test]
    fn test_space_follows_every_punctuation() {
        let vocab = test_vocab();
        let rules = PhonemeRules::new();
        let encoder = Encoder::new(&vocab, &rules);
        let ids = encoder
            .encode("Hello, world.", &TablePhonemizer::new())
            .unwrap();
        for (i, &id) in ids.iter().enumerate() {
            if id == 2 || id == 3 {
                assert_eq!(ids[i + 1], 1, "space id must follow punctuation at {i}");
            }
        }
    }

    #[test]
    fn test_punctuation_only_input() {
        let vocab = test_vocab();
        let rules = PhonemeRules::new();
        let encoder = Encoder::new(&vocab, &rules);
        let ids = encoder.encode("...", &TablePhonemizer::new()).unwrap();
        assert_eq!(ids, vec![BOUNDARY_ID, BOUNDARY_ID]);
    }

    #[test]
    fn test_empty_phoneme_output_recovered() {
        // A phrase the oracle cannot phonemize contributes nothing, but its
        // punctuation is still encoded.
        let vocab = test_vocab();
        let rules = PhonemeRules::new();
        let encoder = Encoder::new(&vocab, &rules);
        let ids = encoder.encode("silence.", &TablePhonemizer::new()).unwrap();
        assert_eq!(ids, vec![BOUNDARY_ID, 3, 1, BOUNDARY_ID]);
    }

    #[test]
    fn test_unknown_symbol_boundary_policy() {
        // "?" is not in the test vocabulary; the legacy policy maps it to 0.
        let vocab = test_vocab();
        let rules = PhonemeRules::new();
        let encoder = Encoder::new(&vocab, &rules);
        let ids = encoder.encode("hello?", &TablePhonemizer::new()).unwrap();
        let expected = vec![BOUNDARY_ID, 10, 11, 12, 18, 13, BOUNDARY_ID, 1, BOUNDARY_ID];
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_unknown_symbol_reject_policy() {
        let vocab = test_vocab();
        let rules = PhonemeRules::new();
        let encoder =
            Encoder::new(&vocab, &rules).with_unknown_policy(UnknownSymbol::Reject);
        let err = encoder
            .encode("hello?", &TablePhonemizer::new())
            .unwrap_err();
        assert!(err.to_string().contains("not in the vocabulary"), "got: {err}");
    }
}
