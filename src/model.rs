//! The Kokoro context object — owns the ONNX session, the vocabulary, the
//! rewrite table, the voice store and one planned post-filter, and exposes
//! the text → waveform pipeline.
//!
//! Uses [`ort`] (ONNX Runtime Rust bindings) for inference.  The model's
//! named inputs and output:
//!
//! | Name        | Shape          | dtype   |
//! |-------------|----------------|---------|
//! | `input_ids` | `[1, seq_len]` | int64   |
//! | `style`     | `[1, 256]`     | float32 |
//! | `speed`     | `[1]`          | int32   |
//! | `waveform`  | `[1, N]`       | float32 |

use std::{path::Path, sync::Mutex};

use anyhow::{Context, Result};
use ort::{session::Session, value::Tensor};
use tracing::info;

use crate::{
    error::KokoroError,
    phonemize::Phonemizer,
    postfilter::{FilterConfig, SpectralPostFilter},
    rules::PhonemeRules,
    tokenize::{Encoder, UnknownSymbol, Vocabulary},
    voices::{VoiceStore, STYLE_DIM},
};

/// Audio sample rate produced by the model.
pub const SAMPLE_RATE: u32 = 24_000;

/// The main TTS handle.  Everything inside is read-only after [`load`]
/// except the ORT session, which is serialized behind a mutex.
///
/// [`load`]: Kokoro::load
pub struct Kokoro {
    session: Mutex<Session>,
    vocab: Vocabulary,
    rules: PhonemeRules,
    voices: VoiceStore,
    post_filter: SpectralPostFilter,
    unknown: UnknownSymbol,
}

impl Kokoro {
    /// Load the model from an ONNX file, a vocabulary JSON file and a voice
    /// directory.  Any missing or malformed file is fatal.
    pub fn load(model_path: &Path, vocab_path: &Path, voices_dir: &Path) -> Result<Self> {
        let session = Session::builder()
            .context("Failed to create ORT session builder")?
            .commit_from_file(model_path)
            .with_context(|| format!("Cannot load ONNX model: {}", model_path.display()))?;

        let vocab = Vocabulary::load(vocab_path)?;
        let voices = VoiceStore::load_dir(voices_dir)?;

        info!(
            model = %model_path.display(),
            symbols = vocab.len(),
            styles = voices.available().len(),
            "loaded Kokoro"
        );

        Ok(Self {
            session: Mutex::new(session),
            vocab,
            rules: PhonemeRules::new(),
            voices,
            post_filter: SpectralPostFilter::new(FilterConfig::default()),
            unknown: UnknownSymbol::default(),
        })
    }

    /// Choose what happens when a symbol is missing from the vocabulary.
    /// The default maps unknowns to the boundary id, as the original did.
    pub fn with_unknown_policy(mut self, unknown: UnknownSymbol) -> Self {
        self.unknown = unknown;
        self
    }

    /// Style names found in the voice directory, sorted.
    pub fn available_styles(&self) -> &[String] {
        self.voices.available()
    }

    /// Encode `text` into the bounded token sequence the model consumes.
    pub fn encode(&self, text: &str, phonemizer: &dyn Phonemizer) -> Result<Vec<i64>> {
        Encoder::new(&self.vocab, &self.rules)
            .with_unknown_policy(self.unknown)
            .encode(text, phonemizer)
    }

    /// Full pipeline: text → token sequence → style row → waveform.
    ///
    /// The post-filter is not applied here; pass the result through
    /// [`post_filter`](Self::post_filter) to opt in.
    pub fn synthesize(
        &self,
        text: &str,
        style: &str,
        speed: i32,
        phonemizer: &dyn Phonemizer,
    ) -> Result<Vec<f32>> {
        let ids = self.encode(text, phonemizer)?;
        let style_row = self.voices.style_for_len(style, ids.len())?.to_vec();
        self.infer(&ids, &style_row, speed)
    }

    /// One inference call.  `style_row` must be a [`STYLE_DIM`]-wide slice.
    fn infer(&self, ids: &[i64], style_row: &[f32], speed: i32) -> Result<Vec<f32>> {
        let seq_len = ids.len();

        let t_input_ids = Tensor::<i64>::from_array(([1usize, seq_len], ids.to_vec()))
            .context("Failed to build input_ids tensor")?;
        let t_style = Tensor::<f32>::from_array(([1usize, STYLE_DIM], style_row.to_vec()))
            .context("Failed to build style tensor")?;
        let t_speed = Tensor::<i32>::from_array(([1usize], vec![speed]))
            .context("Failed to build speed tensor")?;

        let mut session = self.session.lock().unwrap_or_else(|p| p.into_inner());
        let outputs = session
            .run(ort::inputs![
                "input_ids" => t_input_ids,
                "style" => t_style,
                "speed" => t_speed,
            ])
            .context("ONNX inference failed")?;

        let (_shape, audio) = outputs["waveform"]
            .try_extract_tensor::<f32>()
            .context("Failed to extract waveform tensor")?;

        if audio.is_empty() {
            return Err(KokoroError::EmptyWaveform.into());
        }
        Ok(audio.to_vec())
    }

    /// The planned spectral post-filter owned by this context.
    pub fn post_filter(&self) -> &SpectralPostFilter {
        &self.post_filter
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// WAV writer
// ─────────────────────────────────────────────────────────────────────────────

/// Write `audio` to a mono 32-bit float WAV file at [`SAMPLE_RATE`] Hz.
pub fn write_wav(audio: &[f32], output_path: &Path) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(output_path, spec)
        .with_context(|| format!("Cannot create WAV: {}", output_path.display()))?;
    for &sample in audio {
        writer.write_sample(sample).context("WAV write error")?;
    }
    writer.finalize().context("WAV finalise error")?;
    info!(
        samples = audio.len(),
        seconds = audio.len() as f64 / SAMPLE_RATE as f64,
        path = %output_path.display(),
        "saved WAV"
    );
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_wav_round_trip() {
        let path = std::env::temp_dir().join("kokorotts-wav-test.wav");
        let audio: Vec<f32> = (0..256).map(|i| (i as f32 / 256.0) - 0.5).collect();

        write_wav(&audio, &path).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, SAMPLE_RATE);
        assert_eq!(spec.sample_format, hound::SampleFormat::Float);
        let read: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(read, audio);

        std::fs::remove_file(&path).unwrap();
    }
}
