//! Spectral post-filter demonstration — no model or espeak-ng required.
//!
//! Builds a two-tone test signal (1 kHz + 8 kHz), runs it through the
//! post-filter with the reference configuration, and writes both signals to
//! WAV files for listening:
//!
//!   cargo run --example postfilter

use std::path::Path;

use kokorotts::{write_wav, FilterConfig, SpectralPostFilter, SAMPLE_RATE};

fn main() -> anyhow::Result<()> {
    let seconds = 2.0;
    let len = (seconds * SAMPLE_RATE as f32) as usize;

    // 1 kHz sits below the 4.5 kHz cutoff (amplified), 8 kHz above it
    // (attenuated).
    let input: Vec<f32> = (0..len)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            0.4 * (2.0 * std::f32::consts::PI * 1_000.0 * t).sin()
                + 0.4 * (2.0 * std::f32::consts::PI * 8_000.0 * t).sin()
        })
        .collect();

    let config = FilterConfig::default();
    println!(
        "frame {} / hop {} / cutoff bin {}",
        config.frame_size,
        config.hop_size,
        config.cutoff_bin()
    );

    let filter = SpectralPostFilter::new(config);
    let output = filter.process(&input);

    write_wav(&input, Path::new("postfilter_in.wav"))?;
    write_wav(&output, Path::new("postfilter_out.wav"))?;

    println!("wrote postfilter_in.wav and postfilter_out.wav");
    Ok(())
}
