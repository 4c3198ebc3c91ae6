//! Spectral post-filter — STFT analysis, per-bin gain, overlap-add synthesis.
//!
//! The filter amplifies frequency bins below a cutoff and attenuates the
//! bins at or above it, frame by frame: Hamming window → forward FFT →
//! per-bin gain → inverse FFT → window again → overlap-add.  The FFT plans
//! and the window are built once per filter instance; `process` allocates
//! its frame buffer locally, so a shared `&self` is sound.
//!
//! Not wired into the synthesis path by default — callers (and the CLI's
//! `--post-filter` flag) opt in.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Filter parameters.  The defaults reproduce the reference configuration:
/// 2048-sample frames, hop 512, 24 kHz audio, 4.5 kHz cutoff, 0.1 gain above
/// the cutoff and 2.0 below it.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub frame_size: usize,
    pub hop_size: usize,
    pub sample_rate: u32,
    pub cutoff_hz: f32,
    pub attenuation: f32,
    pub amplification: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            frame_size: 2048,
            hop_size: 512,
            sample_rate: 24_000,
            cutoff_hz: 4_500.0,
            attenuation: 0.1,
            amplification: 2.0,
        }
    }
}

impl FilterConfig {
    /// First bin at or above the cutoff frequency:
    /// `floor(cutoff_hz · frame_size / sample_rate)`.
    pub fn cutoff_bin(&self) -> usize {
        (self.cutoff_hz * self.frame_size as f32 / self.sample_rate as f32) as usize
    }
}

/// A planned filter instance: precomputed window plus forward/inverse FFTs.
pub struct SpectralPostFilter {
    config: FilterConfig,
    cutoff_bin: usize,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,
}

impl SpectralPostFilter {
    pub fn new(config: FilterConfig) -> Self {
        let n = config.frame_size;

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(n);
        let ifft = planner.plan_fft_inverse(n);

        // Hamming window, used for both analysis and synthesis.
        let window: Vec<f32> = (0..n)
            .map(|i| {
                0.54 - 0.46 * (2.0 * std::f32::consts::PI * i as f32 / (n - 1) as f32).cos()
            })
            .collect();

        let cutoff_bin = config.cutoff_bin();
        Self { config, cutoff_bin, window, fft, ifft }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Reshape `audio`, returning a buffer of the same length.
    ///
    /// Frame count is `floor((len − frame_size) / hop_size) + 1`; an input
    /// shorter than one frame yields zero frames and an all-zero output of
    /// the input's length.  Samples past the end of the input are zero-padded
    /// during analysis, and only in-range samples receive overlap-add
    /// contributions.
    pub fn process(&self, audio: &[f32]) -> Vec<f32> {
        let n = self.config.frame_size;
        let hop = self.config.hop_size;

        let mut output = vec![0.0f32; audio.len()];
        if audio.len() < n {
            return output;
        }
        let num_frames = (audio.len() - n) / hop + 1;

        let mut buf: Vec<Complex<f32>> = vec![Complex::new(0.0, 0.0); n];
        let scale = 1.0 / n as f32;

        for frame in 0..num_frames {
            let start = frame * hop;

            for i in 0..n {
                let idx = start + i;
                let sample = if idx < audio.len() { audio[idx] * self.window[i] } else { 0.0 };
                buf[i] = Complex::new(sample, 0.0);
            }

            self.fft.process(&mut buf);

            // Bins k and n−k are conjugate mirrors of the same frequency;
            // fold before comparing against the cutoff so both sides get the
            // same gain and the inverse transform stays real.
            for k in 0..n {
                let folded = k.min(n - k);
                let gain = if folded >= self.cutoff_bin {
                    self.config.attenuation
                } else {
                    self.config.amplification
                };
                buf[k] *= gain;
            }

            self.ifft.process(&mut buf);

            // The inverse transform is unnormalized; divide by the frame
            // size, apply the synthesis window, and overlap-add.
            for i in 0..n {
                let idx = start + i;
                if idx < audio.len() {
                    output[idx] += buf[i].re * scale * self.window[i];
                }
            }
        }

        output
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
