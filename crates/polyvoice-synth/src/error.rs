//! Error types for voice management.

use thiserror::Error;

/// Errors raised by the synth, its voices, and waveform descriptors.
///
/// All variants are programmer-error guards: they are reported synchronously
/// and leave the synth exactly as it was before the failing call.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SynthError {
    /// Polyphony must be a non-negative finite integer.
    #[error("invalid polyphony '{0}': expected a non-negative finite integer")]
    InvalidPolyphony(String),

    /// A note was triggered before any voice parameters were configured.
    #[error("no voice parameters configured")]
    MissingVoiceParams,

    /// The waveform kind and periodic wave payload do not agree.
    #[error("invalid waveform configuration: {0}")]
    InvalidWaveformConfiguration(&'static str),
}

impl SynthError {
    /// Create an invalid polyphony error from the rejected input.
    pub fn invalid_polyphony(value: impl ToString) -> Self {
        SynthError::InvalidPolyphony(value.to_string())
    }
}
