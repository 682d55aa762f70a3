//! Polyvoice Synth - polyphonic voice management for the polyvoice framework
//!
//! This crate assigns notes to a bounded pool of voices, steals the least
//! recently triggered voice when the pool is full, and drives each voice's
//! amplitude through an ADSR envelope scheduled on an automation timeline.
//! It never renders audio: sound sources and gain stages are collaborators
//! built by a [`VoiceBackend`].
//!
//! # Core Components
//!
//! ## Voice Pool
//!
//! - [`Synth`] - Resizable pool with age-based allocation and stealing
//! - [`NoteHandle`] - Release capability bound to one `(voice, note)` pair
//! - [`Polyphony`] - Validated pool size
//!
//! ## Voices
//!
//! - [`Voice`] - One reusable channel of polyphony
//! - [`VoiceKind`] - Oscillator, unison stack or noise
//! - [`NoteSlot`] - Ownership of a voice by a note
//!
//! ## Envelopes
//!
//! - [`schedule_attack`] / [`schedule_release`] - ADSR automation, including
//!   the correction for a release that cuts the attack ramp
//! - [`EnvelopeState`] - Envelope stage at a point in time
//!
//! ## Parameters
//!
//! - [`VoiceParams`] - Envelope times, sustain level and waveform
//! - [`UnisonParams`] - Default detuned-sawtooth configuration
//! - [`WaveformDescriptor`] / [`Waveform`] - Waveform request and its validated form
//!
//! ## Collaborators
//!
//! - [`SoundSource`] / [`VoiceBackend`] - What a voice drives
//! - [`RecordingBackend`] / [`RecordingSource`] - Inspectable reference backend
//!
//! # Example: Release During the Attack
//!
//! ```rust
//! use polyvoice_core::{AutomationEvent, ManualClock};
//! use polyvoice_synth::{RecordingBackend, Synth, VoiceParams};
//!
//! let clock = ManualClock::new();
//! let mut synth = Synth::new(RecordingBackend::new(), clock.clone());
//! synth
//!     .set_voice_params(VoiceParams::default().with_attack(0.01).with_release(0.01))
//!     .unwrap();
//! synth.set_polyphony(1).unwrap();
//!
//! let note = synth.note_on(440.0, 1.0).unwrap();
//! clock.advance(0.005);
//! synth.note_off(note);
//!
//! // The release holds the ramp's true value instead of snapping to zero.
//! let gain = synth.voices()[0].gain();
//! assert!((gain.value_at(0.005) - 0.5).abs() < 1e-9);
//! assert!(matches!(
//!     gain.events().last(),
//!     Some(AutomationEvent::SetTarget { target, .. }) if *target == 0.0
//! ));
//! ```
//!
//! # Logging
//!
//! Steals, resizes and dropped notes are logged at `debug`, triggers and
//! releases at `trace`, through the `tracing` facade. The `tracing` feature
//! additionally enables timeline-level events in `polyvoice-core`.

pub mod envelope;
pub mod error;
pub mod ids;
pub mod params;
pub mod source;
pub mod synth;
pub mod voice;

// Re-export main types at crate root
pub use envelope::{
    AttackWindow, EnvelopeState, ReleaseWindow, TIME_CONSTANT_SCALE, schedule_attack,
    schedule_release,
};
pub use error::SynthError;
pub use ids::{NoteId, NoteIds, VoiceId, VoiceIds};
pub use params::{
    PeriodicWave, UnisonParams, VoiceKind, VoiceParams, Waveform, WaveformDescriptor,
    WaveformKind,
};
pub use source::{
    RecordingBackend, RecordingSource, SoundSource, SourceCall, SourceKind, VoiceBackend,
};
pub use synth::{NoteHandle, Polyphony, Synth};
pub use voice::{
    EXPIRED, MAX_UNISON, NoteSlot, TriggerRecord, Voice, cents_to_ratio, midi_to_freq,
    unison_detune,
};
