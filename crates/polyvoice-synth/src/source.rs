//! Sound source and backend contracts.
//!
//! The voice manager never generates audio. Each voice owns one gain
//! timeline and one or more sound sources built by a [`VoiceBackend`], and
//! only schedules control changes on them.

use polyvoice_core::{AutomationTimeline, ParamTimeline};

use crate::params::Waveform;

/// Signal generator owned by a voice.
pub trait SoundSource {
    /// Start producing signal at `time`.
    fn start(&mut self, time: f64);

    /// Stop producing signal at `time`. Terminal.
    fn stop(&mut self, time: f64);

    /// Set the oscillator frequency (Hz) exactly at `time`.
    fn set_frequency_at_time(&mut self, frequency: f64, time: f64);

    /// Set a static detune offset in cents.
    fn set_detune(&mut self, cents: f64);

    /// Select the waveform played from now on.
    fn set_waveform(&mut self, waveform: &Waveform);
}

/// What a backend is asked to build for a voice slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// Oscillator driven by frequency and waveform.
    Periodic,
    /// Aperiodic generator; frequency and waveform are ignored.
    Noise,
}

/// Factory for per-voice collaborators.
///
/// The pool calls this whenever polyphony grows, so it can stay agnostic of
/// the concrete rendering engine.
pub trait VoiceBackend {
    /// Amplitude control of one voice.
    type Gain: AutomationTimeline;
    /// Signal generator type.
    type Source: SoundSource;

    /// Build a gain stage holding silence.
    fn create_gain(&mut self) -> Self::Gain;

    /// Build a sound source of the requested kind.
    fn create_source(&mut self, kind: SourceKind) -> Self::Source;

    /// Take back the collaborators of a disposed voice. Sources are already
    /// stopped and the gain is silenced. The default drops them.
    fn retire(&mut self, gain: Self::Gain, sources: Vec<Self::Source>) {
        let _ = (gain, sources);
    }
}

/// One call received by a [`RecordingSource`].
#[derive(Debug, Clone, PartialEq)]
pub enum SourceCall {
    /// `start(time)`
    Start(f64),
    /// `stop(time)`
    Stop(f64),
    /// `set_frequency_at_time(frequency, time)`
    Frequency {
        /// Hz.
        frequency: f64,
        /// Seconds.
        time: f64,
    },
    /// `set_detune(cents)`
    Detune(f64),
    /// `set_waveform(waveform)`
    Waveform(Waveform),
}

/// Sound source that records every call it receives.
#[derive(Debug, Clone)]
pub struct RecordingSource {
    kind: SourceKind,
    calls: Vec<SourceCall>,
    frequency: ParamTimeline,
    detune: f64,
    waveform: Waveform,
    started: Option<f64>,
    stopped: Option<f64>,
}

impl RecordingSource {
    /// Create an idle recording source.
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            calls: Vec::new(),
            frequency: ParamTimeline::new(440.0),
            detune: 0.0,
            waveform: Waveform::default(),
            started: None,
            stopped: None,
        }
    }

    /// Kind requested from the backend.
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Calls in the order they arrived.
    pub fn calls(&self) -> &[SourceCall] {
        &self.calls
    }

    /// Scheduled frequency points.
    pub fn frequency(&self) -> &ParamTimeline {
        &self.frequency
    }

    /// Current detune in cents.
    pub fn detune(&self) -> f64 {
        self.detune
    }

    /// Current waveform.
    pub fn waveform(&self) -> &Waveform {
        &self.waveform
    }

    /// Start time, if started.
    pub fn started_at(&self) -> Option<f64> {
        self.started
    }

    /// Stop time, if stopped.
    pub fn stopped_at(&self) -> Option<f64> {
        self.stopped
    }
}

impl SoundSource for RecordingSource {
    fn start(&mut self, time: f64) {
        self.started = Some(time);
        self.calls.push(SourceCall::Start(time));
    }

    fn stop(&mut self, time: f64) {
        self.stopped = Some(time);
        self.calls.push(SourceCall::Stop(time));
    }

    fn set_frequency_at_time(&mut self, frequency: f64, time: f64) {
        self.frequency.set_value_at_time(frequency, time);
        self.calls.push(SourceCall::Frequency { frequency, time });
    }

    fn set_detune(&mut self, cents: f64) {
        self.detune = cents;
        self.calls.push(SourceCall::Detune(cents));
    }

    fn set_waveform(&mut self, waveform: &Waveform) {
        self.waveform = waveform.clone();
        self.calls.push(SourceCall::Waveform(waveform.clone()));
    }
}

/// Backend producing [`ParamTimeline`] gains and [`RecordingSource`]s.
///
/// Used by tests and the CLI to inspect exactly what was scheduled. Retired
/// collaborators are kept so disposal can be inspected too.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    gains_created: usize,
    sources_created: usize,
    retired: Vec<(ParamTimeline, Vec<RecordingSource>)>,
}

impl RecordingBackend {
    /// Create a backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of gain stages built so far.
    pub fn gains_created(&self) -> usize {
        self.gains_created
    }

    /// Number of sources built so far.
    pub fn sources_created(&self) -> usize {
        self.sources_created
    }

    /// Gain and sources of every disposed voice, oldest first.
    pub fn retired(&self) -> &[(ParamTimeline, Vec<RecordingSource>)] {
        &self.retired
    }
}

impl VoiceBackend for RecordingBackend {
    type Gain = ParamTimeline;
    type Source = RecordingSource;

    fn create_gain(&mut self) -> ParamTimeline {
        self.gains_created += 1;
        ParamTimeline::new(0.0)
    }

    fn create_source(&mut self, kind: SourceKind) -> RecordingSource {
        self.sources_created += 1;
        RecordingSource::new(kind)
    }

    fn retire(&mut self, gain: ParamTimeline, sources: Vec<RecordingSource>) {
        self.retired.push((gain, sources));
    }
}
