//! Phoneme normalization — an ordered rewrite chain over raw espeak output.
//!
//! The model's vocabulary uses a reduced symbol alphabet: diphthongs are
//! folded to single glyphs (`aɪ` → `I`, `oʊ` → `O`), length marks are
//! removed, and a handful of consonant clusters are remapped (glottal stop
//! variants → `t`/`tn`).  Each rule is a global replacement applied across
//! the whole string.
//!
//! The table order is load-bearing and must not be changed: longer cluster
//! patterns run before the shorter patterns they contain (`ʔˌn̩` before `ʔ`,
//! `ɜːɹ` before `ɜː`, `eɪ` before `e`), and the length-mark eraser `ː` runs
//! last so the `ɜː`-family rules still see their mark.  The final step strips
//! the `_` separators that espeak inserts between phonemes.

use once_cell::sync::Lazy;
use regex::Regex;

/// The rewrite table, in application order.  Every pattern is a literal.
const RULE_TABLE: &[(&str, &str)] = &[
    ("ʔˌn\u{0329}", "tn"),
    ("ʔn\u{0329}", "tn"),
    ("ʔn", "tn"),
    ("ʔ", "t"),
    ("aɪ", "I"),
    ("aʊ", "W"),
    ("dʒ", "ʤ"),
    ("eɪ", "A"),
    ("e", "A"),
    ("tʃ", "ʧ"),
    ("ɔɪ", "Y"),
    ("əl", "ᵊl"),
    ("ʲo", "jo"),
    ("ʲə", "jə"),
    ("ʲ", ""),
    ("ɚ", "əɹ"),
    ("r", "ɹ"),
    ("x", "k"),
    ("ç", "k"),
    ("ɐ", "ə"),
    ("ɬ", "l"),
    ("\u{0303}", ""), // combining tilde (nasalization)
    ("oʊ", "O"),
    ("ɜːɹ", "ɜɹ"),
    ("ɜː", "ɜɹ"),
    ("ɪə", "iə"),
    ("ː", ""),
];

static COMPILED: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    RULE_TABLE
        .iter()
        .map(|&(pattern, replacement)| (Regex::new(pattern).unwrap(), replacement))
        .collect()
});

/// The compiled rewrite chain.  Patterns are compiled once, on first
/// construction; instances are cheap handles onto the shared table.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhonemeRules;

impl PhonemeRules {
    pub fn new() -> Self {
        Lazy::force(&COMPILED);
        PhonemeRules
    }

    /// Normalize a raw phoneme string: run every rule in table order as a
    /// global replacement, then strip all `_` separators.
    pub fn apply(&self, raw: &str) -> String {
        let mut s = raw.to_string();
        for (pattern, replacement) in COMPILED.iter() {
            s = pattern.replace_all(&s, *replacement).into_owned();
        }
        s.replace('_', "")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let rules = PhonemeRules::new();
        let input = "ʔˌn\u{0329} aɪ dʒ eɪ oʊ ɜːɹ";
        assert_eq!(rules.apply(input), rules.apply(input));
    }

    #[test]
    fn test_diphthongs_folded() {
        let rules = PhonemeRules::new();
        assert_eq!(rules.apply("aɪ"), "I");
        assert_eq!(rules.apply("aʊ"), "W");
        assert_eq!(rules.apply("ɔɪ"), "Y");
        assert_eq!(rules.apply("oʊ"), "O");
    }

    #[test]
    fn test_ei_before_e() {
        // If the bare `e` rule ran first, `eɪ` would become `Aɪ`.
        let rules = PhonemeRules::new();
        assert_eq!(rules.apply("eɪ"), "A");
        assert_eq!(rules.apply("e"), "A");
    }

    #[test]
    fn test_glottal_clusters() {
        let rules = PhonemeRules::new();
        assert_eq!(rules.apply("ʔˌn\u{0329}"), "tn");
        assert_eq!(rules.apply("ʔn\u{0329}"), "tn");
        assert_eq!(rules.apply("ʔn"), "tn");
        assert_eq!(rules.apply("ʔ"), "t");
    }

    #[test]
    fn test_long_vowel_before_subset() {
        // Ordering regression: `ɜːɹ` must be rewritten as a unit before the
        // shorter `ɜː` rule sees it, otherwise the output gains a second `ɹ`.
        let rules = PhonemeRules::new();
        assert_eq!(rules.apply("fɜːɹst"), "fɜɹst");
        assert_eq!(rules.apply("ɜːɹ"), "ɜɹ");
        assert_eq!(rules.apply("ɜː"), "ɜɹ");
    }

    #[test]
    fn test_reversed_order_differs() {
        // Applying the same two interacting rules in reverse order produces a
        // different string — the table order is semantically load-bearing.
        let forward = {
            let s = "ɜːɹ".replace("ɜːɹ", "ɜɹ");
            s.replace("ɜː", "ɜɹ")
        };
        let reversed = {
            let s = "ɜːɹ".replace("ɜː", "ɜɹ");
            s.replace("ɜːɹ", "ɜɹ")
        };
        assert_eq!(forward, "ɜɹ");
        assert_eq!(reversed, "ɜɹɹ");
        assert_ne!(forward, reversed);
    }

    #[test]
    fn test_marks_removed() {
        let rules = PhonemeRules::new();
        // U+0303 is the combining tilde, not the precomposed character.
        assert_eq!(rules.apply("a\u{0303}"), "a");
        assert_eq!(rules.apply("iː"), "i");
    }

    #[test]
    fn test_separator_stripped() {
        let rules = PhonemeRules::new();
        assert_eq!(rules.apply("h_ə_l_oʊ"), "həlO");
    }

    #[test]
    fn test_global_replacement() {
        // Every occurrence is rewritten, not just the first.
        let rules = PhonemeRules::new();
        assert_eq!(rules.apply("rɑːr"), "ɹɑɹ");
    }
}
