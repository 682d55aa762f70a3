//! Property-based tests for polyvoice-synth allocation and envelopes.
//!
//! Tests least-recently-triggered stealing for arbitrary pool sizes, the
//! explicit value set when a release cuts the attack ramp, and continuity of
//! the gain curve across any release.

use polyvoice_core::{AutomationEvent, ManualClock};
use polyvoice_synth::{RecordingBackend, Synth, TIME_CONSTANT_SCALE, VoiceParams};
use proptest::prelude::*;

fn pool(voices: usize, params: VoiceParams) -> (Synth<RecordingBackend, ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let mut synth = Synth::new(RecordingBackend::new(), clock.clone());
    synth.set_voice_params(params).unwrap();
    synth.set_polyphony(voices).unwrap();
    (synth, clock)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// After `n` held notes in a pool of `n`, the next note steals the voice
    /// of the first note and leaves every other note sounding.
    #[test]
    fn next_note_steals_first_triggered(n in 1usize..24, step in 0.0f64..0.1) {
        let (mut synth, clock) = pool(n, VoiceParams::default());
        let mut handles = Vec::with_capacity(n);
        for i in 0..n {
            handles.push(synth.note_on(100.0 + i as f64, 1.0).unwrap());
            clock.advance(step);
        }

        let stolen = synth.note_on(1000.0, 1.0).unwrap();

        prop_assert_eq!(stolen.voice_id(), handles[0].voice_id());
        prop_assert!(!synth.is_sounding(&handles[0]));
        for handle in &handles[1..] {
            prop_assert!(synth.is_sounding(handle));
        }
    }

    /// A release strictly inside the attack ramp sets the interpolated value
    /// explicitly at the release time.
    #[test]
    fn mid_attack_release_value(
        attack in 0.001f64..1.0,
        fraction in 0.01f64..0.99,
        velocity in 0.01f64..1.0,
        release in 0.0f64..1.0,
    ) {
        let params = VoiceParams::default().with_attack(attack).with_release(release);
        let (mut synth, clock) = pool(1, params);
        let note = synth.note_on(440.0, velocity).unwrap();

        let elapsed = attack * fraction;
        clock.advance(elapsed);
        prop_assert!(synth.note_off(note));

        let events = synth.voices()[0].gain().events();
        let n = events.len();
        let expected = velocity * elapsed / attack;
        match events[n - 2] {
            AutomationEvent::SetValue { value, time } => {
                prop_assert!((value - expected).abs() < 1e-9, "value {} != {}", value, expected);
                prop_assert_eq!(time, elapsed);
            }
            other => prop_assert!(false, "expected explicit value, got {:?}", other),
        }
        match events[n - 1] {
            AutomationEvent::SetTarget { target, time_constant, .. } => {
                prop_assert_eq!(target, 0.0);
                prop_assert!((time_constant - release * TIME_CONSTANT_SCALE).abs() < 1e-12);
            }
            other => prop_assert!(false, "expected release target, got {:?}", other),
        }
    }

    /// Releasing never makes the gain jump at the release instant.
    #[test]
    fn release_is_continuous(
        attack in 0.001f64..0.5,
        decay in 0.0f64..0.5,
        sustain in 0.0f64..1.0,
        at in 0.0f64..2.0,
    ) {
        let params = VoiceParams::default()
            .with_attack(attack)
            .with_decay(decay)
            .with_sustain(sustain);
        let (mut synth, clock) = pool(1, params);
        let note = synth.note_on(440.0, 1.0).unwrap();

        clock.advance(at);
        let before = synth.voices()[0].gain().value_at(at);
        prop_assert!(synth.note_off(note));
        let after = synth.voices()[0].gain().value_at(at);

        prop_assert!((before - after).abs() < 1e-9, "jump from {} to {} at {}", before, after, at);
    }
}
