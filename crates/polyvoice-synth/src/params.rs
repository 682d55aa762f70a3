//! Voice parameters, waveform descriptors, and default presets.

use std::sync::Arc;

use crate::error::SynthError;
use crate::voice::MAX_UNISON;

/// Waveform shapes a periodic source can be asked to play.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WaveformKind {
    /// Pure fundamental.
    #[default]
    Sine,
    /// Odd harmonics, hollow timbre.
    Square,
    /// All harmonics, bright timbre.
    Sawtooth,
    /// Odd harmonics rolling off quickly.
    Triangle,
    /// User-defined harmonic content from a [`PeriodicWave`].
    Custom,
}

impl WaveformKind {
    /// Lowercase name used in presets and logs.
    pub fn name(self) -> &'static str {
        match self {
            WaveformKind::Sine => "sine",
            WaveformKind::Square => "square",
            WaveformKind::Sawtooth => "sawtooth",
            WaveformKind::Triangle => "triangle",
            WaveformKind::Custom => "custom",
        }
    }

    /// Parse a waveform name (case-insensitive, `saw` accepted).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sine" => Some(WaveformKind::Sine),
            "square" => Some(WaveformKind::Square),
            "sawtooth" | "saw" => Some(WaveformKind::Sawtooth),
            "triangle" => Some(WaveformKind::Triangle),
            "custom" => Some(WaveformKind::Custom),
            _ => None,
        }
    }
}

/// Fourier coefficients describing one period of a custom waveform.
///
/// Index 0 is the DC term and is ignored by most renderers. Both arrays must
/// have the same length, and at least two entries.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicWave {
    /// Cosine terms.
    pub real: Vec<f32>,
    /// Sine terms.
    pub imag: Vec<f32>,
}

impl PeriodicWave {
    /// Create a periodic wave from cosine and sine terms.
    pub fn new(real: Vec<f32>, imag: Vec<f32>) -> Self {
        Self { real, imag }
    }

    /// Number of harmonics described (including DC).
    pub fn len(&self) -> usize {
        self.real.len()
    }

    /// True if no coefficients are present.
    pub fn is_empty(&self) -> bool {
        self.real.is_empty()
    }

    fn validate(&self) -> Result<(), SynthError> {
        if self.real.len() != self.imag.len() {
            return Err(SynthError::InvalidWaveformConfiguration(
                "periodic wave real and imag arrays differ in length",
            ));
        }
        if self.real.len() < 2 {
            return Err(SynthError::InvalidWaveformConfiguration(
                "periodic wave needs at least two coefficients",
            ));
        }
        Ok(())
    }
}

/// Unvalidated waveform request as it arrives from configuration.
///
/// A [`WaveformKind::Custom`] kind must carry a periodic wave, and a periodic
/// wave is only accepted together with the custom kind. Use
/// [`resolve`](Self::resolve) to obtain a [`Waveform`] a source can play.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaveformDescriptor {
    /// Requested shape.
    pub kind: WaveformKind,
    /// Harmonic content for [`WaveformKind::Custom`].
    pub periodic_wave: Option<Arc<PeriodicWave>>,
}

impl WaveformDescriptor {
    /// Describe a built-in waveform.
    pub fn new(kind: WaveformKind) -> Self {
        Self {
            kind,
            periodic_wave: None,
        }
    }

    /// Describe a custom waveform.
    pub fn custom(wave: PeriodicWave) -> Self {
        Self {
            kind: WaveformKind::Custom,
            periodic_wave: Some(Arc::new(wave)),
        }
    }

    /// Check that kind and payload agree without building a [`Waveform`].
    pub fn validate(&self) -> Result<(), SynthError> {
        match (self.kind, &self.periodic_wave) {
            (WaveformKind::Custom, None) => Err(SynthError::InvalidWaveformConfiguration(
                "custom waveform requires a periodic wave",
            )),
            (WaveformKind::Custom, Some(wave)) => wave.validate(),
            (_, Some(_)) => Err(SynthError::InvalidWaveformConfiguration(
                "periodic wave supplied without selecting the custom waveform",
            )),
            (_, None) => Ok(()),
        }
    }

    /// Validate and convert into a playable [`Waveform`].
    pub fn resolve(&self) -> Result<Waveform, SynthError> {
        self.validate()?;
        Ok(match (self.kind, &self.periodic_wave) {
            (WaveformKind::Custom, Some(wave)) => Waveform::Custom(Arc::clone(wave)),
            (WaveformKind::Square, _) => Waveform::Square,
            (WaveformKind::Sawtooth, _) => Waveform::Sawtooth,
            (WaveformKind::Triangle, _) => Waveform::Triangle,
            _ => Waveform::Sine,
        })
    }
}

/// Validated waveform handed to sound sources.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Waveform {
    /// Pure fundamental.
    #[default]
    Sine,
    /// Square wave.
    Square,
    /// Sawtooth wave.
    Sawtooth,
    /// Triangle wave.
    Triangle,
    /// Custom harmonic content.
    Custom(Arc<PeriodicWave>),
}

impl Waveform {
    /// Kind of this waveform.
    pub fn kind(&self) -> WaveformKind {
        match self {
            Waveform::Sine => WaveformKind::Sine,
            Waveform::Square => WaveformKind::Square,
            Waveform::Sawtooth => WaveformKind::Sawtooth,
            Waveform::Triangle => WaveformKind::Triangle,
            Waveform::Custom(_) => WaveformKind::Custom,
        }
    }
}

/// Per-trigger parameters shared by every voice in a synth.
///
/// Times are in seconds, `sustain_level` is a fraction of the note velocity.
/// Values are taken as given; negative times are treated as zero and the
/// sustain level is clamped to `[0, 1]` when the envelope is scheduled.
///
/// # Example
///
/// ```rust
/// use polyvoice_synth::{VoiceParams, WaveformDescriptor, WaveformKind};
///
/// let params = VoiceParams::default()
///     .with_attack(0.005)
///     .with_release(0.4)
///     .with_waveform(WaveformDescriptor::new(WaveformKind::Sawtooth));
///
/// assert_eq!(params.decay_time, 0.1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceParams {
    /// Delay between the trigger call and the start of the attack.
    pub audio_delay: f64,
    /// Linear ramp duration from 0 to the note velocity.
    pub attack_time: f64,
    /// Perceptual decay duration toward the sustain level.
    pub decay_time: f64,
    /// Sustain level as a fraction of velocity.
    pub sustain_level: f64,
    /// Perceptual release duration toward silence.
    pub release_time: f64,
    /// Waveform played by periodic sources.
    pub waveform: WaveformDescriptor,
}

impl Default for VoiceParams {
    /// Default values:
    /// - Audio delay: 0s
    /// - Attack: 10ms
    /// - Decay: 100ms
    /// - Sustain: 0.7
    /// - Release: 200ms
    /// - Waveform: sine
    fn default() -> Self {
        Self {
            audio_delay: 0.0,
            attack_time: 0.01,
            decay_time: 0.1,
            sustain_level: 0.7,
            release_time: 0.2,
            waveform: WaveformDescriptor::default(),
        }
    }
}

impl VoiceParams {
    /// Set the audio delay in seconds.
    pub fn with_audio_delay(mut self, seconds: f64) -> Self {
        self.audio_delay = seconds;
        self
    }

    /// Set the attack time in seconds.
    pub fn with_attack(mut self, seconds: f64) -> Self {
        self.attack_time = seconds;
        self
    }

    /// Set the decay time in seconds.
    pub fn with_decay(mut self, seconds: f64) -> Self {
        self.decay_time = seconds;
        self
    }

    /// Set the sustain level (fraction of velocity).
    pub fn with_sustain(mut self, level: f64) -> Self {
        self.sustain_level = level;
        self
    }

    /// Set the release time in seconds.
    pub fn with_release(mut self, seconds: f64) -> Self {
        self.release_time = seconds;
        self
    }

    /// Set the waveform.
    pub fn with_waveform(mut self, waveform: WaveformDescriptor) -> Self {
        self.waveform = waveform;
        self
    }
}

/// Closed set of voice variants.
///
/// The variant only decides which sources a voice owns and how a trigger
/// configures them; allocation and envelope scheduling are shared.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum VoiceKind {
    /// One periodic source.
    #[default]
    Oscillator,
    /// `count` periodic sources detuned symmetrically across `spread_cents`.
    Unison {
        /// Number of sources (clamped to `1..=MAX_UNISON`).
        count: usize,
        /// Total detune spread in cents from center to either edge.
        spread_cents: f64,
    },
    /// One aperiodic source; note frequency is ignored.
    Noise,
}

impl VoiceKind {
    /// Number of sources a voice of this kind owns.
    pub fn source_count(self) -> usize {
        match self {
            VoiceKind::Oscillator | VoiceKind::Noise => 1,
            VoiceKind::Unison { count, .. } => count.clamp(1, MAX_UNISON),
        }
    }
}

/// Default unison configuration: a detuned sawtooth stack.
#[derive(Debug, Clone, PartialEq)]
pub struct UnisonParams {
    /// Envelope and waveform for every trigger.
    pub params: VoiceParams,
    /// Sources per voice.
    pub count: usize,
    /// Detune spread in cents.
    pub spread_cents: f64,
}

impl Default for UnisonParams {
    /// Sawtooth, 5 sources, 20 cents spread, otherwise [`VoiceParams::default`].
    fn default() -> Self {
        Self {
            params: VoiceParams::default()
                .with_waveform(WaveformDescriptor::new(WaveformKind::Sawtooth)),
            count: 5,
            spread_cents: 20.0,
        }
    }
}

impl UnisonParams {
    /// Voice kind described by these parameters.
    pub fn kind(&self) -> VoiceKind {
        VoiceKind::Unison {
            count: self.count,
            spread_cents: self.spread_cents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saw_wave() -> PeriodicWave {
        PeriodicWave::new(vec![0.0, 0.0, 0.0], vec![0.0, 1.0, 0.5])
    }

    #[test]
    fn test_builtin_waveforms_resolve() {
        for kind in [
            WaveformKind::Sine,
            WaveformKind::Square,
            WaveformKind::Sawtooth,
            WaveformKind::Triangle,
        ] {
            let waveform = WaveformDescriptor::new(kind).resolve().unwrap();
            assert_eq!(waveform.kind(), kind);
        }
    }

    #[test]
    fn test_custom_waveform_resolves() {
        let waveform = WaveformDescriptor::custom(saw_wave()).resolve().unwrap();
        assert!(matches!(waveform, Waveform::Custom(ref w) if w.len() == 3));
    }

    #[test]
    fn test_custom_without_payload_rejected() {
        let descriptor = WaveformDescriptor::new(WaveformKind::Custom);
        assert!(matches!(
            descriptor.resolve(),
            Err(SynthError::InvalidWaveformConfiguration(_))
        ));
    }

    #[test]
    fn test_payload_without_custom_rejected() {
        let descriptor = WaveformDescriptor {
            kind: WaveformKind::Square,
            periodic_wave: Some(Arc::new(saw_wave())),
        };
        assert!(matches!(
            descriptor.validate(),
            Err(SynthError::InvalidWaveformConfiguration(_))
        ));
    }

    #[test]
    fn test_malformed_periodic_wave_rejected() {
        let mismatched = WaveformDescriptor::custom(PeriodicWave::new(vec![0.0, 1.0], vec![0.0]));
        assert!(mismatched.validate().is_err());

        let too_short = WaveformDescriptor::custom(PeriodicWave::new(vec![0.0], vec![0.0]));
        assert!(too_short.validate().is_err());
    }

    #[test]
    fn test_waveform_names_round_trip() {
        for kind in [
            WaveformKind::Sine,
            WaveformKind::Square,
            WaveformKind::Sawtooth,
            WaveformKind::Triangle,
            WaveformKind::Custom,
        ] {
            assert_eq!(WaveformKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(WaveformKind::from_name("SAW"), Some(WaveformKind::Sawtooth));
        assert_eq!(WaveformKind::from_name("pulse"), None);
    }

    #[test]
    fn test_default_params() {
        let params = VoiceParams::default();
        assert_eq!(params.audio_delay, 0.0);
        assert_eq!(params.attack_time, 0.01);
        assert_eq!(params.sustain_level, 0.7);
        assert_eq!(params.release_time, 0.2);
        assert_eq!(params.waveform.kind, WaveformKind::Sine);
    }

    #[test]
    fn test_default_unison_params() {
        let unison = UnisonParams::default();
        assert_eq!(unison.params.waveform.kind, WaveformKind::Sawtooth);
        assert_eq!(unison.kind().source_count(), 5);
    }

    #[test]
    fn test_source_count_clamped() {
        let none = VoiceKind::Unison {
            count: 0,
            spread_cents: 10.0,
        };
        let many = VoiceKind::Unison {
            count: 1000,
            spread_cents: 10.0,
        };
        assert_eq!(none.source_count(), 1);
        assert_eq!(many.source_count(), MAX_UNISON);
        assert_eq!(VoiceKind::Noise.source_count(), 1);
    }
}
