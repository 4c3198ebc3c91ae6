//! # kokorotts
//!
//! Rust port of `kokoro.cpp` — a lightweight ONNX-based text-to-speech
//! front-end for the Kokoro model, plus an STFT spectral post-filter.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::path::Path;
//! use kokorotts::{Kokoro, write_wav};
//! # #[cfg(feature = "espeak")] {
//! use kokorotts::phonemize::{EspeakBackend, EN_US};
//!
//! let tts = Kokoro::load(
//!     Path::new("models/kokoro.onnx"),
//!     Path::new("models/vocab.json"),
//!     Path::new("voices"),
//! ).unwrap();
//!
//! let phonemizer = EspeakBackend::new(EN_US).unwrap();
//! let audio = tts.synthesize("Hello, world.", "af_heart", 1, &phonemizer).unwrap();
//! write_wav(&audio, Path::new("output.wav")).unwrap();
//! # }
//! ```
//!
//! ## Pipeline
//! 1. **Segmentation** — text is lower-cased and split into phrase and
//!    punctuation fragments ([`segment`]).
//! 2. **Phonemization** — each phrase goes to an external oracle behind the
//!    [`phonemize::Phonemizer`] trait (espeak-ng with the `espeak` feature).
//! 3. **Normalization** — an ordered rewrite chain folds the raw phonemes
//!    onto the model's reduced symbol alphabet ([`rules`]).
//! 4. **Tokenisation** — symbols map to integer ids from the vocabulary,
//!    wrapped with boundary sentinels ([`tokenize`]).
//! 5. **Inference** — the ONNX model takes `(input_ids, style, speed)` and
//!    returns a 24 kHz waveform ([`model`]).
//! 6. **Post-filter** (optional) — STFT per-bin gain with overlap-add
//!    synthesis ([`postfilter`]).
//!
//! The token-sequence length (minus the two sentinels) selects the style
//! vector row, so every utterance length needs a matching entry in the voice
//! table ([`voices`]).
//!
//! ## Build requirements
//! The default feature set has no native dependency.  The `espeak` feature
//! links `libespeak-ng` (`apt install libespeak-ng-dev` /
//! `brew install espeak-ng`); the `cli` feature adds the `kokorotts` binary.

pub mod error;
pub mod model;
pub mod phonemize;
pub mod postfilter;
pub mod rules;
pub mod segment;
pub mod tokenize;
pub mod voices;

// ─── Re-exports for convenience ─────────────────────────────────────────────

pub use error::KokoroError;
pub use model::{write_wav, Kokoro, SAMPLE_RATE};
pub use postfilter::{FilterConfig, SpectralPostFilter};
pub use tokenize::{UnknownSymbol, BOUNDARY_ID};
pub use voices::STYLE_DIM;
