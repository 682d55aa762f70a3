//! Voice pool with age-based stealing.
//!
//! [`Synth`] owns a resizable pool of [`Voice`]s that all share one clock,
//! one set of [`VoiceParams`] and one note-id space. Every note-on ages every
//! voice by one round and takes the oldest; released and never-used voices
//! carry [`EXPIRED`](crate::voice::EXPIRED) age, so they are always reused
//! before a sounding voice is stolen.

use core::convert::Infallible;
use core::fmt;

use polyvoice_core::Clock;

use crate::error::SynthError;
use crate::ids::{NoteId, NoteIds, VoiceId, VoiceIds};
use crate::params::{UnisonParams, VoiceKind, VoiceParams};
use crate::source::VoiceBackend;
use crate::voice::{Voice, midi_to_freq};

/// Validated pool size.
///
/// Built from integers, floats or strings via `TryFrom`; anything that is not
/// a non-negative finite whole number is rejected with
/// [`SynthError::InvalidPolyphony`].
///
/// ```rust
/// use polyvoice_synth::Polyphony;
///
/// assert_eq!(Polyphony::try_from(8.0).unwrap().get(), 8);
/// assert!(Polyphony::try_from(-1).is_err());
/// assert!(Polyphony::try_from(f64::INFINITY).is_err());
/// assert!(Polyphony::try_from("many").is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Polyphony(usize);

impl Polyphony {
    /// Wrap a voice count.
    pub const fn new(voices: usize) -> Self {
        Self(voices)
    }

    /// Number of voices.
    pub const fn get(self) -> usize {
        self.0
    }
}

impl TryFrom<usize> for Polyphony {
    type Error = SynthError;

    fn try_from(value: usize) -> Result<Self, SynthError> {
        Ok(Self(value))
    }
}

impl TryFrom<u32> for Polyphony {
    type Error = SynthError;

    fn try_from(value: u32) -> Result<Self, SynthError> {
        usize::try_from(value)
            .map(Self)
            .map_err(|_| SynthError::invalid_polyphony(value))
    }
}

impl TryFrom<i32> for Polyphony {
    type Error = SynthError;

    fn try_from(value: i32) -> Result<Self, SynthError> {
        usize::try_from(value)
            .map(Self)
            .map_err(|_| SynthError::invalid_polyphony(value))
    }
}

impl TryFrom<i64> for Polyphony {
    type Error = SynthError;

    fn try_from(value: i64) -> Result<Self, SynthError> {
        usize::try_from(value)
            .map(Self)
            .map_err(|_| SynthError::invalid_polyphony(value))
    }
}

impl TryFrom<f64> for Polyphony {
    type Error = SynthError;

    fn try_from(value: f64) -> Result<Self, SynthError> {
        if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value < usize::MAX as f64 {
            Ok(Self(value as usize))
        } else {
            Err(SynthError::invalid_polyphony(value))
        }
    }
}

impl TryFrom<f32> for Polyphony {
    type Error = SynthError;

    fn try_from(value: f32) -> Result<Self, SynthError> {
        Self::try_from(f64::from(value))
    }
}

impl TryFrom<&str> for Polyphony {
    type Error = SynthError;

    fn try_from(value: &str) -> Result<Self, SynthError> {
        let parsed: f64 = value
            .trim()
            .parse()
            .map_err(|_| SynthError::invalid_polyphony(value))?;
        Self::try_from(parsed).map_err(|_| SynthError::invalid_polyphony(value))
    }
}

impl From<Infallible> for SynthError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

/// Release capability for one triggered note.
///
/// Holds the `(voice, note)` pair the note was assigned. Releasing through a
/// handle whose voice has since been stolen or resized away does nothing.
/// A detached handle, returned when the pool is empty, never releases
/// anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use = "a dropped handle cannot release its note; only all_notes_off or stealing will"]
pub struct NoteHandle {
    target: Option<(VoiceId, NoteId)>,
}

impl NoteHandle {
    fn bound(voice: VoiceId, note: NoteId) -> Self {
        Self {
            target: Some((voice, note)),
        }
    }

    /// Handle that refers to no voice.
    pub fn detached() -> Self {
        Self { target: None }
    }

    /// True if the note was dropped because no voice was available.
    pub fn is_detached(&self) -> bool {
        self.target.is_none()
    }

    /// Voice the note was assigned to.
    pub fn voice_id(&self) -> Option<VoiceId> {
        self.target.map(|(voice, _)| voice)
    }

    /// Note id issued for the trigger.
    pub fn note_id(&self) -> Option<NoteId> {
        self.target.map(|(_, note)| note)
    }
}

/// Age every voice by one round and pick the oldest.
///
/// Ties go to the lowest index. That follows from the strict comparison and
/// iteration order; it is not a fairness guarantee.
fn allocate<G, S>(voices: &mut [Voice<G, S>]) -> Option<usize> {
    let mut chosen = None;
    let mut oldest = 0;
    for (index, voice) in voices.iter_mut().enumerate() {
        let age = voice.grow_older();
        if age > oldest {
            oldest = age;
            chosen = Some(index);
        }
    }
    chosen
}

/// Polyphonic voice manager.
///
/// Generic over the [`VoiceBackend`] that builds each voice's collaborators
/// and the [`Clock`] every scheduled time is read from.
///
/// # Example
///
/// ```rust
/// use polyvoice_core::ManualClock;
/// use polyvoice_synth::{RecordingBackend, Synth, VoiceParams};
///
/// let clock = ManualClock::new();
/// let mut synth = Synth::new(RecordingBackend::new(), clock.clone());
/// synth.set_voice_params(VoiceParams::default()).unwrap();
/// synth.set_polyphony(2).unwrap();
///
/// let a = synth.note_on(440.0, 1.0).unwrap();
/// let _b = synth.note_on(550.0, 1.0).unwrap();
///
/// // A third note steals the voice that played A.
/// clock.advance(0.1);
/// let c = synth.note_on(660.0, 1.0).unwrap();
/// assert_eq!(c.voice_id(), a.voice_id());
///
/// // A's handle is now stale.
/// assert!(!synth.note_off(a));
/// assert!(synth.note_off(c));
/// ```
pub struct Synth<B: VoiceBackend, C: Clock> {
    backend: B,
    clock: C,
    kind: VoiceKind,
    params: Option<VoiceParams>,
    voices: Vec<Voice<B::Gain, B::Source>>,
    note_ids: NoteIds,
    voice_ids: VoiceIds,
}

impl<B: VoiceBackend, C: Clock> fmt::Debug for Synth<B, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Synth")
            .field("kind", &self.kind)
            .field("params", &self.params)
            .field("polyphony", &self.voices.len())
            .field("next_note_id", &self.note_ids.peek())
            .finish_non_exhaustive()
    }
}

impl<B: VoiceBackend, C: Clock> Synth<B, C> {
    /// Create an empty pool of single-oscillator voices with no parameters.
    pub fn new(backend: B, clock: C) -> Self {
        Self::with_kind(backend, clock, VoiceKind::Oscillator)
    }

    /// Create an empty pool of `kind` voices with no parameters.
    pub fn with_kind(backend: B, clock: C, kind: VoiceKind) -> Self {
        Self {
            backend,
            clock,
            kind,
            params: None,
            voices: Vec::new(),
            note_ids: NoteIds::new(),
            voice_ids: VoiceIds::new(),
        }
    }

    /// Create an empty unison pool configured from `unison`.
    pub fn unison(backend: B, clock: C, unison: UnisonParams) -> Result<Self, SynthError> {
        let mut synth = Self::with_kind(backend, clock, unison.kind());
        synth.set_voice_params(unison.params)?;
        Ok(synth)
    }

    /// Use shared id counters instead of private ones.
    ///
    /// Call before [`set_polyphony`](Self::set_polyphony); voices already in
    /// the pool keep their ids.
    pub fn with_ids(mut self, note_ids: NoteIds, voice_ids: VoiceIds) -> Self {
        self.note_ids = note_ids;
        self.voice_ids = voice_ids;
        self
    }

    /// Set the parameters applied to every future trigger.
    ///
    /// Notes already sounding keep the parameters they were triggered with.
    pub fn set_voice_params(&mut self, params: VoiceParams) -> Result<(), SynthError> {
        params.waveform.validate()?;
        tracing::trace!(
            attack = params.attack_time,
            decay = params.decay_time,
            sustain = params.sustain_level,
            release = params.release_time,
            waveform = params.waveform.kind.name(),
            "voice params set"
        );
        self.params = Some(params);
        Ok(())
    }

    /// Parameters applied to future triggers, if configured.
    pub fn voice_params(&self) -> Option<&VoiceParams> {
        self.params.as_ref()
    }

    /// Variant every voice in the pool is built as.
    pub fn kind(&self) -> VoiceKind {
        self.kind
    }

    /// Resize the pool.
    ///
    /// Growing appends idle voices. Shrinking disposes trailing voices in pool
    /// order, cutting whatever they were playing. On error the pool is left
    /// unchanged.
    pub fn set_polyphony<N>(&mut self, voices: N) -> Result<(), SynthError>
    where
        N: TryInto<Polyphony>,
        SynthError: From<N::Error>,
    {
        let target = voices.try_into()?.get();
        let current = self.voices.len();
        let now = self.clock.now();

        if target > current {
            self.voices.reserve(target - current);
            for _ in current..target {
                let id = self.voice_ids.issue();
                self.voices
                    .push(Voice::new(id, self.kind, &mut self.backend, now));
            }
        } else if target < current {
            for voice in self.voices.drain(target..) {
                let (gain, sources) = voice.dispose(now);
                self.backend.retire(gain, sources);
            }
        }

        if target != current {
            tracing::debug!("polyphony: {current} -> {target} voices");
        }
        Ok(())
    }

    /// Current pool size.
    pub fn polyphony(&self) -> usize {
        self.voices.len()
    }

    /// Trigger a note, stealing the oldest voice when all are busy.
    ///
    /// With an empty pool the note is dropped and a detached handle returned.
    pub fn note_on(&mut self, frequency: f64, velocity: f64) -> Result<NoteHandle, SynthError> {
        let params = self.params.as_ref().ok_or(SynthError::MissingVoiceParams)?;
        params.waveform.validate()?;

        let Some(index) = allocate(&mut self.voices) else {
            tracing::debug!("note dropped: no voices (frequency {frequency} Hz)");
            return Ok(NoteHandle::detached());
        };

        let note_id = self.note_ids.issue();
        let now = self.clock.now();
        let voice = &mut self.voices[index];
        if let Some(previous) = voice.owner() {
            tracing::debug!("steal: {} from {previous} for {note_id}", voice.id());
        }

        voice.note_on(frequency, velocity, note_id, params, now)?;
        tracing::trace!(
            voice = %voice.id(),
            note = %note_id,
            frequency,
            velocity,
            "note on"
        );
        Ok(NoteHandle::bound(voice.id(), note_id))
    }

    /// Trigger a MIDI note. Velocity 0–127 maps to 0–1.
    pub fn note_on_midi(&mut self, note: u8, velocity: u8) -> Result<NoteHandle, SynthError> {
        let velocity = f64::from(velocity.min(127)) / 127.0;
        self.note_on(midi_to_freq(note), velocity)
    }

    /// Release the note behind `handle`.
    ///
    /// Returns `true` if a release was scheduled. Detached and stale handles
    /// return `false` and change nothing.
    pub fn note_off(&mut self, handle: NoteHandle) -> bool {
        let Some((voice_id, note_id)) = handle.target else {
            return false;
        };
        let now = self.clock.now();
        let Some(voice) = self.voices.iter_mut().find(|v| v.id() == voice_id) else {
            tracing::trace!("note off ignored: {voice_id} no longer in pool");
            return false;
        };

        let released = voice.release(note_id, now);
        if released {
            tracing::trace!(voice = %voice_id, note = %note_id, "note off");
        } else {
            tracing::trace!("note off ignored: {note_id} no longer owns {voice_id}");
        }
        released
    }

    /// Release every held note. Returns how many were released.
    ///
    /// Idempotent: a second call finds nothing held and schedules nothing.
    pub fn all_notes_off(&mut self) -> usize {
        let now = self.clock.now();
        let released = self
            .voices
            .iter_mut()
            .filter_map(|voice| voice.release_current(now))
            .count();
        tracing::debug!("all notes off: {released} released");
        released
    }

    /// Voices in allocation order.
    pub fn voices(&self) -> &[Voice<B::Gain, B::Source>] {
        &self.voices
    }

    /// Voice with the given id, if still in the pool.
    pub fn voice(&self, id: VoiceId) -> Option<&Voice<B::Gain, B::Source>> {
        self.voices.iter().find(|v| v.id() == id)
    }

    /// True while `handle` still owns its voice: triggered, not yet released,
    /// not stolen.
    pub fn is_sounding(&self, handle: &NoteHandle) -> bool {
        handle.target.is_some_and(|(voice_id, note_id)| {
            self.voice(voice_id)
                .is_some_and(|voice| voice.owner() == Some(note_id))
        })
    }

    /// Number of voices currently held by a note.
    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.owner().is_some()).count()
    }

    /// Backend that built the voices.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Clock every scheduled time is read from.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Note-id counter used for triggers.
    pub fn note_ids(&self) -> &NoteIds {
        &self.note_ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::RecordingBackend;
    use crate::voice::EXPIRED;
    use polyvoice_core::ManualClock;

    fn synth(voices: usize) -> (Synth<RecordingBackend, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let mut synth = Synth::new(RecordingBackend::new(), clock.clone());
        synth.set_voice_params(VoiceParams::default()).unwrap();
        synth.set_polyphony(voices).unwrap();
        (synth, clock)
    }

    #[test]
    fn test_polyphony_from_numbers() {
        assert_eq!(Polyphony::try_from(4usize).unwrap().get(), 4);
        assert_eq!(Polyphony::try_from(4u32).unwrap().get(), 4);
        assert_eq!(Polyphony::try_from(0i32).unwrap().get(), 0);
        assert_eq!(Polyphony::try_from(16i64).unwrap().get(), 16);
        assert_eq!(Polyphony::try_from(3.0f32).unwrap().get(), 3);
        assert_eq!(Polyphony::try_from(" 6 ").unwrap().get(), 6);
    }

    #[test]
    fn test_polyphony_rejects_invalid() {
        assert!(Polyphony::try_from(-1i32).is_err());
        assert!(Polyphony::try_from(-1i64).is_err());
        assert!(Polyphony::try_from(f64::INFINITY).is_err());
        assert!(Polyphony::try_from(f64::NAN).is_err());
        assert!(Polyphony::try_from(2.5).is_err());
        assert!(Polyphony::try_from("").is_err());
        assert!(Polyphony::try_from("four").is_err());
        assert_eq!(
            Polyphony::try_from("four"),
            Err(SynthError::InvalidPolyphony("four".to_string()))
        );
    }

    #[test]
    fn test_grow_and_shrink() {
        let (mut synth, _clock) = synth(3);
        assert_eq!(synth.polyphony(), 3);
        assert!(synth.voices().iter().all(|v| v.age() == EXPIRED));

        synth.set_polyphony(1).unwrap();
        assert_eq!(synth.polyphony(), 1);
        assert_eq!(synth.backend().retired().len(), 2);

        synth.set_polyphony(Polyphony::new(2)).unwrap();
        let ids: Vec<u64> = synth.voices().iter().map(|v| v.id().get()).collect();
        assert_eq!(ids, vec![0, 3]);
    }

    #[test]
    fn test_invalid_polyphony_leaves_pool() {
        let (mut synth, _clock) = synth(2);
        assert!(synth.set_polyphony(-1).is_err());
        assert!(synth.set_polyphony(f64::NAN).is_err());
        assert!(synth.set_polyphony("lots").is_err());
        assert_eq!(synth.polyphony(), 2);
    }

    #[test]
    fn test_missing_params() {
        let clock = ManualClock::new();
        let mut synth = Synth::new(RecordingBackend::new(), clock);
        synth.set_polyphony(2).unwrap();

        assert_eq!(synth.note_on(440.0, 1.0), Err(SynthError::MissingVoiceParams));
        assert!(synth.voices().iter().all(|v| v.age() == EXPIRED));
    }

    #[test]
    fn test_empty_pool_drops_note() {
        let (mut synth, _clock) = synth(0);
        let handle = synth.note_on(440.0, 1.0).unwrap();

        assert!(handle.is_detached());
        assert!(!synth.note_off(handle));
        assert_eq!(synth.note_ids().peek(), 1);
    }

    #[test]
    fn test_allocation_prefers_idle_voices() {
        let (mut synth, _clock) = synth(3);
        let a = synth.note_on(440.0, 1.0).unwrap();
        let b = synth.note_on(550.0, 1.0).unwrap();
        let c = synth.note_on(660.0, 1.0).unwrap();

        let voices: Vec<_> = [a, b, c].iter().filter_map(NoteHandle::voice_id).collect();
        assert_eq!(voices.len(), 3);
        assert_ne!(voices[0], voices[1]);
        assert_ne!(voices[1], voices[2]);
        assert_ne!(voices[0], voices[2]);
    }

    #[test]
    fn test_released_voice_reused_before_steal() {
        let (mut synth, _clock) = synth(2);
        let a = synth.note_on(440.0, 1.0).unwrap();
        let b = synth.note_on(550.0, 1.0).unwrap();
        assert!(synth.note_off(b));

        let c = synth.note_on(660.0, 1.0).unwrap();
        assert_eq!(c.voice_id(), b.voice_id());
        assert!(synth.is_sounding(&a));
    }

    #[test]
    fn test_tie_goes_to_lowest_index() {
        let (mut synth, _clock) = synth(4);
        let first = synth.note_on(440.0, 1.0).unwrap();
        assert_eq!(first.voice_id(), Some(synth.voices()[0].id()));
    }

    #[test]
    fn test_all_notes_off_counts() {
        let (mut synth, _clock) = synth(3);
        let _a = synth.note_on(440.0, 1.0).unwrap();
        let _b = synth.note_on(550.0, 1.0).unwrap();

        assert_eq!(synth.active_voice_count(), 2);
        assert_eq!(synth.all_notes_off(), 2);
        assert_eq!(synth.all_notes_off(), 0);
        assert_eq!(synth.active_voice_count(), 0);
    }

    #[test]
    fn test_note_on_midi_scales_velocity() {
        let (mut synth, _clock) = synth(1);
        let handle = synth.note_on_midi(69, 127).unwrap();
        let voice = synth.voices()[0].last_trigger().copied().unwrap();

        assert_eq!(handle.note_id(), Some(voice.note_id));
        assert!((voice.frequency - 440.0).abs() < 1e-9);
        assert_eq!(voice.window.velocity, 1.0);
    }

    #[test]
    fn test_note_off_after_shrink_is_ignored() {
        let (mut synth, _clock) = synth(2);
        let _a = synth.note_on(440.0, 1.0).unwrap();
        let b = synth.note_on(550.0, 1.0).unwrap();

        synth.set_polyphony(1).unwrap();
        assert!(!synth.note_off(b));
        assert!(!synth.is_sounding(&b));
    }
}
