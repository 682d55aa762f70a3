//! A single reusable channel of polyphony.
//!
//! A voice owns one gain timeline and the sound sources for its
//! [`VoiceKind`], for its whole life in the pool. Notes come and go; the
//! collaborators stay. Ownership of the voice by a note is tracked with a
//! [`NoteSlot`], and only the owning note may release it.
//!
//! ## Age
//!
//! Age counts allocation rounds since the voice was last triggered. A trigger
//! resets it to 0 and a release sets it to [`EXPIRED`], which keeps released
//! and never-used voices far ahead of any sounding voice when the pool looks
//! for a voice to reuse.
//!
//! ## Unison detune
//!
//! For `count` sources with spread `s`, source `i` gets:
//! ```text
//! detune_cents = s * (2*i / (count-1) - 1)
//! ```
//! This distributes sources symmetrically around the note pitch.

use polyvoice_core::AutomationTimeline;

use crate::envelope::{self, AttackWindow, EnvelopeState, ReleaseWindow};
use crate::error::SynthError;
use crate::ids::{NoteId, VoiceId};
use crate::params::{VoiceKind, VoiceParams};
use crate::source::{SoundSource, SourceKind, VoiceBackend};

/// Maximum number of sources in a unison voice.
pub const MAX_UNISON: usize = 16;

/// Age of an idle or released voice.
///
/// Large but finite, so aging it further never overflows in practice and it
/// still compares above any sounding voice.
pub const EXPIRED: u64 = 1 << 62;

/// Which note, if any, currently owns a voice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NoteSlot {
    /// Never triggered.
    #[default]
    Vacant,
    /// Explicitly released; the release tail may still be audible.
    Released,
    /// Held by this note.
    Owned(NoteId),
}

impl NoteSlot {
    /// Owning note, if held.
    pub fn owner(self) -> Option<NoteId> {
        match self {
            NoteSlot::Owned(id) => Some(id),
            NoteSlot::Vacant | NoteSlot::Released => None,
        }
    }
}

/// What one trigger scheduled, captured for the matching release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerRecord {
    /// Note that owns the voice after this trigger.
    pub note_id: NoteId,
    /// Clock time of the trigger call.
    pub triggered_at: f64,
    /// Note frequency in Hz.
    pub frequency: f64,
    /// Attack ramp scheduled on the gain.
    pub window: AttackWindow,
    /// Release duration captured at trigger time.
    pub release_time: f64,
}

/// One voice of a pool.
#[derive(Debug)]
pub struct Voice<G, S> {
    id: VoiceId,
    kind: VoiceKind,
    gain: G,
    sources: Vec<S>,
    age: u64,
    slot: NoteSlot,
    last_trigger: Option<TriggerRecord>,
    release: Option<ReleaseWindow>,
}

impl<G, S> Voice<G, S> {
    /// Stable identity within the pool.
    pub fn id(&self) -> VoiceId {
        self.id
    }

    /// Variant this voice was built as.
    pub fn kind(&self) -> VoiceKind {
        self.kind
    }

    /// Allocation rounds since the last trigger, or [`EXPIRED`].
    pub fn age(&self) -> u64 {
        self.age
    }

    /// Current ownership.
    pub fn slot(&self) -> NoteSlot {
        self.slot
    }

    /// Note currently holding this voice.
    pub fn owner(&self) -> Option<NoteId> {
        self.slot.owner()
    }

    /// Gain timeline.
    pub fn gain(&self) -> &G {
        &self.gain
    }

    /// Sound sources, in detune order for unison voices.
    pub fn sources(&self) -> &[S] {
        &self.sources
    }

    /// Most recent trigger, if any.
    pub fn last_trigger(&self) -> Option<&TriggerRecord> {
        self.last_trigger.as_ref()
    }

    /// Release scheduled for the most recent trigger, if any.
    pub fn release_window(&self) -> Option<&ReleaseWindow> {
        self.release.as_ref()
    }

    /// Envelope stage at `time`.
    pub fn state(&self, time: f64) -> EnvelopeState {
        match &self.last_trigger {
            Some(trigger) => envelope::state_at(&trigger.window, self.release.as_ref(), time),
            None => EnvelopeState::Idle,
        }
    }

    /// Advance age by one allocation round and return the new age.
    #[inline]
    pub fn grow_older(&mut self) -> u64 {
        self.age = self.age.saturating_add(1);
        self.age
    }
}

impl<G: AutomationTimeline, S: SoundSource> Voice<G, S> {
    /// Build an idle voice and start its sources at `now`.
    pub fn new<B>(id: VoiceId, kind: VoiceKind, backend: &mut B, now: f64) -> Self
    where
        B: VoiceBackend<Gain = G, Source = S>,
    {
        let source_kind = match kind {
            VoiceKind::Noise => SourceKind::Noise,
            VoiceKind::Oscillator | VoiceKind::Unison { .. } => SourceKind::Periodic,
        };
        let count = kind.source_count();
        let gain = backend.create_gain();
        let mut sources: Vec<S> = (0..count).map(|_| backend.create_source(source_kind)).collect();

        if let VoiceKind::Unison { spread_cents, .. } = kind {
            for (i, source) in sources.iter_mut().enumerate() {
                source.set_detune(unison_detune(i, count, spread_cents));
            }
        }
        for source in &mut sources {
            source.start(now);
        }

        Self {
            id,
            kind,
            gain,
            sources,
            age: EXPIRED,
            slot: NoteSlot::Vacant,
            last_trigger: None,
            release: None,
        }
    }

    /// Take this voice for `note_id`, overwriting any note in flight.
    ///
    /// The attack starts at `now + audio_delay`, where the frequency is also
    /// set. Fails only if the waveform descriptor is invalid, before anything
    /// is scheduled.
    pub fn note_on(
        &mut self,
        frequency: f64,
        velocity: f64,
        note_id: NoteId,
        params: &VoiceParams,
        now: f64,
    ) -> Result<TriggerRecord, SynthError> {
        let waveform = match self.kind {
            VoiceKind::Noise => None,
            VoiceKind::Oscillator | VoiceKind::Unison { .. } => Some(params.waveform.resolve()?),
        };
        let start = now + params.audio_delay.max(0.0);

        if let Some(waveform) = &waveform {
            for source in &mut self.sources {
                source.set_waveform(waveform);
                source.set_frequency_at_time(frequency, start);
            }
        }
        let window = envelope::schedule_attack(&mut self.gain, start, velocity, params);

        let record = TriggerRecord {
            note_id,
            triggered_at: now,
            frequency,
            window,
            release_time: params.release_time,
        };
        self.age = 0;
        self.slot = NoteSlot::Owned(note_id);
        self.last_trigger = Some(record);
        self.release = None;
        Ok(record)
    }

    /// Release the note `note_id` at `now`.
    ///
    /// Returns `false`, scheduling nothing, if the voice is no longer owned
    /// by that note.
    pub fn release(&mut self, note_id: NoteId, now: f64) -> bool {
        if self.slot != NoteSlot::Owned(note_id) {
            return false;
        }
        let Some(trigger) = self.last_trigger else {
            return false;
        };

        let release =
            envelope::schedule_release(&mut self.gain, &trigger.window, trigger.release_time, now);
        self.age = EXPIRED;
        self.slot = NoteSlot::Released;
        self.release = Some(release);
        true
    }

    /// Release whichever note holds this voice. Returns the released note.
    pub fn release_current(&mut self, now: f64) -> Option<NoteId> {
        let owner = self.owner()?;
        self.release(owner, now).then_some(owner)
    }

    /// Stop the sources, silence the gain, and hand both back.
    pub fn dispose(mut self, now: f64) -> (G, Vec<S>) {
        self.gain.cancel_scheduled_values(now);
        self.gain.set_value_at_time(0.0, now);
        for source in &mut self.sources {
            source.stop(now);
        }
        (self.gain, self.sources)
    }
}

/// Detune in cents of source `index` out of `count` spread over `spread_cents`.
pub fn unison_detune(index: usize, count: usize, spread_cents: f64) -> f64 {
    if count <= 1 {
        return 0.0;
    }
    spread_cents * (2.0 * index as f64 / (count - 1) as f64 - 1.0)
}

/// Convert MIDI note number to frequency in Hz.
///
/// Uses standard tuning: A4 (note 69) = 440 Hz.
#[inline]
pub fn midi_to_freq(note: u8) -> f64 {
    440.0 * libm::pow(2.0, (f64::from(note) - 69.0) / 12.0)
}

/// Convert cents to frequency ratio.
///
/// 100 cents = 1 semitone.
#[inline]
pub fn cents_to_ratio(cents: f64) -> f64 {
    libm::pow(2.0, cents / 1200.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{NoteIds, VoiceIds};
    use crate::params::{WaveformDescriptor, WaveformKind};
    use crate::source::{RecordingBackend, RecordingSource, SourceCall};
    use polyvoice_core::ParamTimeline;

    type TestVoice = Voice<ParamTimeline, RecordingSource>;

    fn voice(kind: VoiceKind) -> TestVoice {
        let mut backend = RecordingBackend::new();
        Voice::new(VoiceIds::new().issue(), kind, &mut backend, 0.0)
    }

    #[test]
    fn test_midi_to_freq_a4() {
        let freq = midi_to_freq(69);
        assert!((freq - 440.0).abs() < 1e-9, "A4 should be 440 Hz, got {freq}");
    }

    #[test]
    fn test_midi_to_freq_middle_c() {
        let freq = midi_to_freq(60);
        assert!((freq - 261.63).abs() < 0.01, "C4 should be ~261.63 Hz, got {freq}");
    }

    #[test]
    fn test_cents_to_ratio() {
        assert!((cents_to_ratio(1200.0) - 2.0).abs() < 1e-9);
        assert!((cents_to_ratio(0.0) - 1.0).abs() < 1e-12);
        assert!((cents_to_ratio(-1200.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_unison_detune_symmetric() {
        assert_eq!(unison_detune(0, 5, 20.0), -20.0);
        assert_eq!(unison_detune(2, 5, 20.0), 0.0);
        assert_eq!(unison_detune(4, 5, 20.0), 20.0);
        assert_eq!(unison_detune(0, 1, 20.0), 0.0);
    }

    #[test]
    fn test_new_voice_is_idle_and_started() {
        let v = voice(VoiceKind::Oscillator);
        assert_eq!(v.age(), EXPIRED);
        assert_eq!(v.slot(), NoteSlot::Vacant);
        assert_eq!(v.state(0.0), EnvelopeState::Idle);
        assert_eq!(v.sources().len(), 1);
        assert_eq!(v.sources()[0].started_at(), Some(0.0));
        assert!(v.gain().is_empty());
    }

    #[test]
    fn test_unison_voice_detunes_sources() {
        let v = voice(VoiceKind::Unison {
            count: 3,
            spread_cents: 10.0,
        });
        let detunes: Vec<f64> = v.sources().iter().map(RecordingSource::detune).collect();
        assert_eq!(detunes, vec![-10.0, 0.0, 10.0]);
    }

    #[test]
    fn test_note_on_sets_owner_and_frequency() {
        let mut v = voice(VoiceKind::Oscillator);
        let id = NoteIds::new().issue();
        let params = VoiceParams::default()
            .with_audio_delay(0.25)
            .with_waveform(WaveformDescriptor::new(WaveformKind::Square));

        let record = v.note_on(330.0, 0.9, id, &params, 1.0).unwrap();

        assert_eq!(record.window.start, 1.25);
        assert_eq!(v.age(), 0);
        assert_eq!(v.owner(), Some(id));
        let source = &v.sources()[0];
        assert_eq!(source.frequency().value_at(1.25), 330.0);
        assert!(source.calls().contains(&SourceCall::Waveform(crate::params::Waveform::Square)));
        assert_eq!(v.state(1.255), EnvelopeState::Attack);
    }

    #[test]
    fn test_noise_voice_ignores_frequency() {
        let mut v = voice(VoiceKind::Noise);
        let id = NoteIds::new().issue();
        v.note_on(1000.0, 1.0, id, &VoiceParams::default(), 0.0).unwrap();

        assert_eq!(v.sources()[0].calls(), &[SourceCall::Start(0.0)]);
        assert_eq!(v.owner(), Some(id));
    }

    #[test]
    fn test_release_requires_ownership() {
        let mut v = voice(VoiceKind::Oscillator);
        let ids = NoteIds::new();
        let first = ids.issue();
        let second = ids.issue();
        let params = VoiceParams::default();

        v.note_on(440.0, 1.0, first, &params, 0.0).unwrap();
        v.note_on(550.0, 1.0, second, &params, 0.1).unwrap();
        let events_before = v.gain().len();

        assert!(!v.release(first, 0.2));
        assert_eq!(v.owner(), Some(second));
        assert_eq!(v.gain().len(), events_before);

        assert!(v.release(second, 0.2));
        assert_eq!(v.slot(), NoteSlot::Released);
        assert_eq!(v.age(), EXPIRED);
        assert!(!v.release(second, 0.3));
    }

    #[test]
    fn test_release_current() {
        let mut v = voice(VoiceKind::Oscillator);
        assert_eq!(v.release_current(0.0), None);

        let id = NoteIds::new().issue();
        v.note_on(440.0, 1.0, id, &VoiceParams::default(), 0.0).unwrap();
        assert_eq!(v.release_current(0.5), Some(id));
        assert_eq!(v.release_current(0.6), None);
        assert_eq!(v.state(0.55), EnvelopeState::Release);
    }

    #[test]
    fn test_invalid_waveform_schedules_nothing() {
        let mut v = voice(VoiceKind::Oscillator);
        let id = NoteIds::new().issue();
        let params =
            VoiceParams::default().with_waveform(WaveformDescriptor::new(WaveformKind::Custom));

        let result = v.note_on(440.0, 1.0, id, &params, 0.0);

        assert!(matches!(result, Err(SynthError::InvalidWaveformConfiguration(_))));
        assert!(v.gain().is_empty());
        assert_eq!(v.slot(), NoteSlot::Vacant);
    }

    #[test]
    fn test_grow_older_saturates() {
        let mut v = voice(VoiceKind::Oscillator);
        v.age = u64::MAX;
        assert_eq!(v.grow_older(), u64::MAX);
    }

    #[test]
    fn test_dispose_stops_and_silences() {
        let mut v = voice(VoiceKind::Oscillator);
        let id = NoteIds::new().issue();
        v.note_on(440.0, 1.0, id, &VoiceParams::default(), 0.0).unwrap();

        let (gain, sources) = v.dispose(0.5);

        assert_eq!(gain.value_at(0.5), 0.0);
        assert_eq!(gain.value_at(10.0), 0.0);
        assert_eq!(sources[0].stopped_at(), Some(0.5));
    }
}
