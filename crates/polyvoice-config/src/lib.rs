//! Voice presets for the polyvoice synth.
//!
//! A preset captures everything needed to stand up a [`Synth`]: the voice
//! variant, the pool size, envelope times and the waveform. Presets are TOML
//! files; a handful of factory presets are compiled in.
//!
//! # Features
//!
//! - **Preset files**: load and save [`VoicePreset`] as TOML
//! - **Validation**: range checks with every problem reported at once
//! - **Factory presets**: built-in presets for each voice variant
//!
//! # Example
//!
//! ```rust
//! use polyvoice_config::get_factory_preset;
//! use polyvoice_core::ManualClock;
//! use polyvoice_synth::RecordingBackend;
//!
//! let preset = get_factory_preset("supersaw").unwrap();
//! let mut synth = preset
//!     .build_synth(RecordingBackend::new(), ManualClock::new())
//!     .unwrap();
//!
//! let note = synth.note_on_midi(60, 100).unwrap();
//! assert!(synth.is_sounding(&note));
//! assert_eq!(synth.backend().sources_created(), 8 * 7);
//! ```
//!
//! [`Synth`]: polyvoice_synth::Synth

mod error;
mod preset;

/// Preset validation.
pub mod validation;

/// Factory presets bundled with the library.
pub mod factory_presets;

pub use error::ConfigError;
pub use factory_presets::{
    FACTORY_PRESET_NAMES, factory_preset_names, factory_presets, find_preset, get_factory_preset,
    is_factory_preset,
};
pub use preset::{EnvelopeConfig, VoiceConfig, VoicePreset, WaveformConfig};
pub use validation::{ValidationError, ValidationResult, validate_preset, validate_range};
