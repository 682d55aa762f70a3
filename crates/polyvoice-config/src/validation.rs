//! Voice preset validation.
//!
//! The synth accepts any envelope times and clamps what it must. Presets are
//! held to tighter, human-sized ranges so a typo in a file is reported
//! instead of producing a ten-minute release.
//!
//! # Example
//!
//! ```rust
//! use polyvoice_config::{VoicePreset, validate_preset};
//!
//! let mut preset = VoicePreset::new("Typo");
//! preset.envelope.sustain = 7.0;
//!
//! assert!(validate_preset(&preset).is_err());
//! ```

use polyvoice_synth::MAX_UNISON;
use thiserror::Error;

use crate::preset::{VoiceConfig, VoicePreset};

/// Largest polyphony a preset may request.
pub const MAX_PRESET_POLYPHONY: u32 = 256;

/// Longest envelope segment a preset may request, in seconds.
pub const MAX_SEGMENT_SECONDS: f64 = 60.0;

/// Widest unison spread a preset may request, in cents.
pub const MAX_SPREAD_CENTS: f64 = 1200.0;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Parameter value out of range.
    #[error("parameter '{param}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Name of the parameter.
        param: String,
        /// The value that was out of range.
        value: f64,
        /// Minimum allowed value.
        min: f64,
        /// Maximum allowed value.
        max: f64,
    },

    /// Invalid parameter format.
    #[error("invalid format for parameter '{param}': {reason}")]
    InvalidFormat {
        /// Name of the parameter.
        param: String,
        /// Description of the format error.
        reason: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Check that `value` is finite and inside `[min, max]`.
pub fn validate_range(param: &str, value: f64, min: f64, max: f64) -> ValidationResult<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            param: param.to_string(),
            value,
            min,
            max,
        })
    }
}

/// Validate every field of a preset.
///
/// All problems are collected; a single problem is returned as is, several
/// as [`ValidationError::Multiple`].
pub fn validate_preset(preset: &VoicePreset) -> ValidationResult<()> {
    let mut errors = Vec::new();

    if preset.name.trim().is_empty() {
        errors.push(ValidationError::InvalidFormat {
            param: "name".to_string(),
            reason: "preset name must not be empty".to_string(),
        });
    }

    if preset.polyphony > MAX_PRESET_POLYPHONY {
        errors.push(ValidationError::OutOfRange {
            param: "polyphony".to_string(),
            value: f64::from(preset.polyphony),
            min: 0.0,
            max: f64::from(MAX_PRESET_POLYPHONY),
        });
    }

    let envelope = &preset.envelope;
    let checks = [
        ("envelope.audio_delay", envelope.audio_delay, MAX_SEGMENT_SECONDS),
        ("envelope.attack", envelope.attack, MAX_SEGMENT_SECONDS),
        ("envelope.decay", envelope.decay, MAX_SEGMENT_SECONDS),
        ("envelope.sustain", envelope.sustain, 1.0),
        ("envelope.release", envelope.release, MAX_SEGMENT_SECONDS),
    ];
    for (param, value, max) in checks {
        if let Err(e) = validate_range(param, value, 0.0, max) {
            errors.push(e);
        }
    }

    if let VoiceConfig::Unison {
        count,
        spread_cents,
    } = preset.voice
    {
        if count == 0 || count > MAX_UNISON {
            errors.push(ValidationError::OutOfRange {
                param: "voice.count".to_string(),
                value: count as f64,
                min: 1.0,
                max: MAX_UNISON as f64,
            });
        }
        if let Err(e) = validate_range("voice.spread_cents", spread_cents, 0.0, MAX_SPREAD_CENTS) {
            errors.push(e);
        }
    }

    match preset.waveform.to_descriptor() {
        Ok(descriptor) => {
            if let Err(e) = descriptor.validate() {
                errors.push(ValidationError::InvalidFormat {
                    param: "waveform".to_string(),
                    reason: e.to_string(),
                });
            }
        }
        Err(e) => errors.push(e),
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.swap_remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}
