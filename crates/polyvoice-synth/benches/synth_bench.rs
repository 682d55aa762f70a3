//! Criterion benchmarks for polyvoice-synth allocation
//!
//! Run with: cargo bench -p polyvoice-synth

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use polyvoice_core::ManualClock;
use polyvoice_synth::{RecordingBackend, Synth, UnisonParams, VoiceParams};

const POOL_SIZES: &[usize] = &[1, 8, 32, 128];

// ============================================================================
// Note-on throughput
// ============================================================================

fn bench_note_on_steal(c: &mut Criterion) {
    let mut group = c.benchmark_group("NoteOnSteal");

    for &voices in POOL_SIZES {
        group.bench_with_input(BenchmarkId::from_parameter(voices), &voices, |b, &n| {
            let clock = ManualClock::new();
            let mut synth = Synth::new(RecordingBackend::new(), clock.clone());
            synth.set_voice_params(VoiceParams::default()).unwrap();
            synth.set_polyphony(n).unwrap();

            b.iter(|| {
                clock.advance(0.001);
                let handle = synth.note_on(black_box(440.0), black_box(0.8)).unwrap();
                black_box(synth.note_off(handle))
            });
        });
    }

    group.finish();
}

fn bench_unison_note_on(c: &mut Criterion) {
    let mut group = c.benchmark_group("UnisonNoteOn");

    for &voices in POOL_SIZES {
        group.bench_with_input(BenchmarkId::from_parameter(voices), &voices, |b, &n| {
            let clock = ManualClock::new();
            let mut synth =
                Synth::unison(RecordingBackend::new(), clock.clone(), UnisonParams::default())
                    .unwrap();
            synth.set_polyphony(n).unwrap();

            b.iter(|| {
                clock.advance(0.001);
                black_box(synth.note_on_midi(black_box(60), 100).unwrap())
            });
        });
    }

    group.finish();
}

fn bench_all_notes_off(c: &mut Criterion) {
    let mut group = c.benchmark_group("AllNotesOff");

    for &voices in POOL_SIZES {
        group.bench_with_input(BenchmarkId::from_parameter(voices), &voices, |b, &n| {
            let clock = ManualClock::new();
            let mut synth = Synth::new(RecordingBackend::new(), clock.clone());
            synth.set_voice_params(VoiceParams::default()).unwrap();
            synth.set_polyphony(n).unwrap();

            b.iter(|| {
                clock.advance(0.001);
                for _ in 0..n {
                    let _ = synth.note_on(440.0, 1.0).unwrap();
                }
                black_box(synth.all_notes_off())
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_note_on_steal,
    bench_unison_note_on,
    bench_all_notes_off
);
criterion_main!(benches);
