//! Typed errors for the policy-relevant failure modes.
//!
//! Startup file problems (missing vocabulary, malformed voice table, model
//! load) are reported through `anyhow` with file context at the call site;
//! the variants here are the ones callers may want to match on.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KokoroError {
    /// A requested style name has no entry in the voice store.
    #[error("unknown style '{style}'; available: {available:?}")]
    UnknownStyle { style: String, available: Vec<String> },

    /// The style table has no vector for the requested utterance length.
    /// Token-sequence length (minus the two boundary sentinels) indexes the
    /// table, so this is a caller error, not something to clamp silently.
    #[error("style '{style}' has no vector for utterance length {index} (table holds {rows})")]
    StyleIndexOutOfRange { style: String, index: usize, rows: usize },

    /// A symbol was absent from the vocabulary while the encoder was
    /// configured to reject unknowns.
    #[error("symbol {symbol:?} is not in the vocabulary")]
    UnknownSymbol { symbol: String },

    /// The inference engine produced no samples.
    #[error("inference returned an empty waveform")]
    EmptyWaveform,
}
