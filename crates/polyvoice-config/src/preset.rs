//! Voice preset file format and operations.

use std::path::Path;
use std::sync::Arc;

use polyvoice_core::Clock;
use polyvoice_synth::{
    PeriodicWave, Synth, VoiceBackend, VoiceKind, VoiceParams, WaveformDescriptor, WaveformKind,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::validation::{ValidationError, validate_preset};

/// Voice preset describing a whole synth configuration.
///
/// Presets are stored as TOML files. They can be loaded from files, created
/// programmatically, and saved to disk. Sections that are left out take the
/// values of [`VoiceParams::default`].
///
/// # TOML Format
///
/// ```toml
/// name = "Supersaw"
/// description = "Detuned sawtooth stack"
/// polyphony = 8
///
/// [voice]
/// kind = "unison"
/// count = 7
/// spread_cents = 25.0
///
/// [envelope]
/// attack = 0.02
/// decay = 0.3
/// sustain = 0.8
/// release = 0.5
///
/// [waveform]
/// kind = "sawtooth"
/// ```
///
/// A custom waveform lists its Fourier terms:
///
/// ```toml
/// [waveform]
/// kind = "custom"
/// real = [0.0, 0.0, 0.0]
/// imag = [0.0, 1.0, 0.5]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoicePreset {
    /// Name of the preset.
    pub name: String,

    /// Optional description of the preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Number of voices (defaults to 8).
    #[serde(default = "default_polyphony")]
    pub polyphony: u32,

    /// Voice variant.
    #[serde(default)]
    pub voice: VoiceConfig,

    /// Envelope times in seconds and sustain level.
    #[serde(default)]
    pub envelope: EnvelopeConfig,

    /// Waveform played by periodic sources.
    #[serde(default)]
    pub waveform: WaveformConfig,
}

fn default_polyphony() -> u32 {
    8
}

/// Voice variant section.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum VoiceConfig {
    /// One oscillator per voice.
    #[default]
    Oscillator,
    /// Detuned oscillator stack per voice.
    Unison {
        /// Oscillators per voice.
        #[serde(default = "default_unison_count")]
        count: usize,
        /// Detune spread in cents.
        #[serde(default = "default_unison_spread")]
        spread_cents: f64,
    },
    /// Noise source per voice.
    Noise,
}

fn default_unison_count() -> usize {
    5
}

fn default_unison_spread() -> f64 {
    20.0
}

impl From<VoiceConfig> for VoiceKind {
    fn from(config: VoiceConfig) -> Self {
        match config {
            VoiceConfig::Oscillator => VoiceKind::Oscillator,
            VoiceConfig::Unison {
                count,
                spread_cents,
            } => VoiceKind::Unison {
                count,
                spread_cents,
            },
            VoiceConfig::Noise => VoiceKind::Noise,
        }
    }
}

impl From<VoiceKind> for VoiceConfig {
    fn from(kind: VoiceKind) -> Self {
        match kind {
            VoiceKind::Oscillator => VoiceConfig::Oscillator,
            VoiceKind::Unison {
                count,
                spread_cents,
            } => VoiceConfig::Unison {
                count,
                spread_cents,
            },
            VoiceKind::Noise => VoiceConfig::Noise,
        }
    }
}

/// Envelope section. Times in seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// Delay before the attack starts.
    pub audio_delay: f64,
    /// Attack ramp duration.
    pub attack: f64,
    /// Decay duration toward sustain.
    pub decay: f64,
    /// Sustain level as a fraction of velocity.
    pub sustain: f64,
    /// Release duration toward silence.
    pub release: f64,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        let params = VoiceParams::default();
        Self {
            audio_delay: params.audio_delay,
            attack: params.attack_time,
            decay: params.decay_time,
            sustain: params.sustain_level,
            release: params.release_time,
        }
    }
}

/// Waveform section.
///
/// `kind` is kept as text so an unknown name is reported by validation
/// rather than failing the whole parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaveformConfig {
    /// Waveform name: sine, square, sawtooth, triangle or custom.
    #[serde(default = "default_waveform")]
    pub kind: String,

    /// Cosine terms of a custom waveform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real: Option<Vec<f32>>,

    /// Sine terms of a custom waveform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imag: Option<Vec<f32>>,
}

fn default_waveform() -> String {
    WaveformKind::Sine.name().to_string()
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self::named(WaveformKind::Sine)
    }
}

impl WaveformConfig {
    /// Built-in waveform by kind.
    pub fn named(kind: WaveformKind) -> Self {
        Self {
            kind: kind.name().to_string(),
            real: None,
            imag: None,
        }
    }

    /// Custom waveform from Fourier terms.
    pub fn custom(real: Vec<f32>, imag: Vec<f32>) -> Self {
        Self {
            kind: WaveformKind::Custom.name().to_string(),
            real: Some(real),
            imag: Some(imag),
        }
    }

    /// Convert into a waveform descriptor.
    ///
    /// Only the name is checked here; kind/payload agreement is checked by
    /// [`WaveformDescriptor::validate`].
    pub fn to_descriptor(&self) -> Result<WaveformDescriptor, ValidationError> {
        let kind =
            WaveformKind::from_name(&self.kind).ok_or_else(|| ValidationError::InvalidFormat {
                param: "waveform.kind".to_string(),
                reason: format!("unknown waveform '{}'", self.kind),
            })?;
        let periodic_wave = match (&self.real, &self.imag) {
            (None, None) => None,
            (real, imag) => Some(Arc::new(PeriodicWave::new(
                real.clone().unwrap_or_default(),
                imag.clone().unwrap_or_default(),
            ))),
        };
        Ok(WaveformDescriptor {
            kind,
            periodic_wave,
        })
    }
}

impl From<&WaveformDescriptor> for WaveformConfig {
    fn from(descriptor: &WaveformDescriptor) -> Self {
        Self {
            kind: descriptor.kind.name().to_string(),
            real: descriptor.periodic_wave.as_ref().map(|w| w.real.clone()),
            imag: descriptor.periodic_wave.as_ref().map(|w| w.imag.clone()),
        }
    }
}

impl VoicePreset {
    /// Create a new preset with default voice settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            polyphony: default_polyphony(),
            voice: VoiceConfig::default(),
            envelope: EnvelopeConfig::default(),
            waveform: WaveformConfig::default(),
        }
    }

    /// Create a preset with a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the number of voices.
    pub fn with_polyphony(mut self, polyphony: u32) -> Self {
        self.polyphony = polyphony;
        self
    }

    /// Set the voice variant.
    pub fn with_kind(mut self, kind: VoiceKind) -> Self {
        self.voice = kind.into();
        self
    }

    /// Copy envelope and waveform from voice parameters.
    pub fn with_voice_params(mut self, params: &VoiceParams) -> Self {
        self.envelope = EnvelopeConfig {
            audio_delay: params.audio_delay,
            attack: params.attack_time,
            decay: params.decay_time,
            sustain: params.sustain_level,
            release: params.release_time,
        };
        self.waveform = WaveformConfig::from(&params.waveform);
        self
    }

    /// Load a preset from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load a preset from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the preset to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the preset to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Voice variant for the synth.
    pub fn voice_kind(&self) -> VoiceKind {
        self.voice.into()
    }

    /// Voice parameters described by this preset.
    ///
    /// Fails on an unknown waveform name or a custom waveform whose payload
    /// does not agree with its kind.
    pub fn to_voice_params(&self) -> Result<VoiceParams, ConfigError> {
        let waveform = self.waveform.to_descriptor()?;
        waveform.validate()?;
        Ok(VoiceParams {
            audio_delay: self.envelope.audio_delay,
            attack_time: self.envelope.attack,
            decay_time: self.envelope.decay,
            sustain_level: self.envelope.sustain,
            release_time: self.envelope.release,
            waveform,
        })
    }

    /// Validate the preset and build a configured synth from it.
    pub fn build_synth<B, C>(&self, backend: B, clock: C) -> Result<Synth<B, C>, ConfigError>
    where
        B: VoiceBackend,
        C: Clock,
    {
        validate_preset(self)?;
        let params = self.to_voice_params()?;

        let mut synth = Synth::with_kind(backend, clock, self.voice_kind());
        synth.set_voice_params(params)?;
        synth.set_polyphony(self.polyphony)?;
        Ok(synth)
    }
}

impl Default for VoicePreset {
    fn default() -> Self {
        Self::new("Untitled")
    }
}
