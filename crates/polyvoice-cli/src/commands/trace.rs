//! Note script tracing.
//!
//! Plays a short note script against a preset on a manual clock with the
//! recording backend, then prints what every voice had scheduled. Nothing is
//! rendered; the output is the automation a real backend would receive.
//!
//! A note script is a comma-separated list of `note@start:duration`, where
//! `note` is a MIDI note number and times are in seconds:
//!
//! ```text
//! 60@0:0.5, 64@0.1:0.3, 67@0.2:1
//! ```

use std::fmt::Write as _;

use anyhow::Context;
use clap::Args;
use polyvoice_config::VoicePreset;
use polyvoice_core::{AutomationEvent, ManualClock};
use polyvoice_synth::{NoteHandle, RecordingBackend};

use super::find_preset;

#[derive(Args)]
pub struct TraceArgs {
    /// Factory preset name or path to a preset file
    #[arg(short, long, default_value = "init")]
    preset: String,

    /// Note script, e.g. "60@0:0.5,64@0.1:0.3"
    #[arg(short, long)]
    notes: String,

    /// MIDI velocity for every note (0-127)
    #[arg(long, default_value_t = 100)]
    velocity: u8,

    /// Gain sampling interval in seconds
    #[arg(long, default_value_t = 0.05)]
    step: f64,

    /// Stop sampling at this time (defaults to the last note-off plus the
    /// preset's release time)
    #[arg(long)]
    until: Option<f64>,
}

/// One note of a script.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptNote {
    /// MIDI note number.
    pub note: u8,
    /// Note-on time in seconds.
    pub start: f64,
    /// Time held before note-off, in seconds.
    pub duration: f64,
}

impl ScriptNote {
    fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Most gain samples printed per voice.
pub const MAX_SAMPLES: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Action {
    Off(usize),
    On(usize),
}

impl Action {
    /// Order among actions at the same time: note-offs of held notes, then
    /// note-ons, then note-offs of zero-length notes.
    fn rank(self, notes: &[ScriptNote]) -> u8 {
        match self {
            Action::Off(i) if notes[i].duration > 0.0 => 0,
            Action::On(_) => 1,
            Action::Off(_) => 2,
        }
    }
}

pub fn run(args: TraceArgs) -> anyhow::Result<()> {
    let preset = find_preset(&args.preset)?;
    let notes = parse_note_script(&args.notes)?;
    tracing::info!(preset = %preset.name, notes = notes.len(), "tracing note script");

    let report = trace_report(&preset, &notes, args.velocity, args.step, args.until)?;
    print!("{report}");
    Ok(())
}

/// Parse a note script into notes in script order.
pub fn parse_note_script(script: &str) -> anyhow::Result<Vec<ScriptNote>> {
    let mut notes = Vec::new();

    for entry in script.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }

        let (note, timing) = entry
            .split_once('@')
            .with_context(|| format!("invalid note '{entry}' (expected note@start:duration)"))?;
        let (start, duration) = timing
            .split_once(':')
            .with_context(|| format!("invalid note '{entry}' (expected note@start:duration)"))?;

        let note: u8 = note
            .trim()
            .parse()
            .with_context(|| format!("invalid MIDI note in '{entry}'"))?;
        if note > 127 {
            anyhow::bail!("MIDI note {note} out of range 0-127");
        }
        let start = parse_seconds(start, entry)?;
        let duration = parse_seconds(duration, entry)?;

        notes.push(ScriptNote {
            note,
            start,
            duration,
        });
    }

    if notes.is_empty() {
        anyhow::bail!("note script is empty");
    }
    Ok(notes)
}

fn parse_seconds(text: &str, entry: &str) -> anyhow::Result<f64> {
    let value: f64 = text
        .trim()
        .parse()
        .with_context(|| format!("invalid time '{}' in '{entry}'", text.trim()))?;
    if !value.is_finite() || value < 0.0 {
        anyhow::bail!("time '{}' in '{entry}' must be a non-negative number", text.trim());
    }
    Ok(value)
}

/// Note-ons and note-offs in time order. At equal times a note ending frees
/// its voice before another starts, and a zero-length note starts before it
/// ends.
fn schedule(notes: &[ScriptNote]) -> Vec<(f64, Action)> {
    let mut actions: Vec<(f64, Action)> = notes
        .iter()
        .enumerate()
        .flat_map(|(i, n)| [(n.start, Action::On(i)), (n.end(), Action::Off(i))])
        .collect();
    actions.sort_by(|a, b| {
        a.0.total_cmp(&b.0)
            .then_with(|| a.1.rank(notes).cmp(&b.1.rank(notes)))
    });
    actions
}

/// Run `notes` against `preset` and describe the result.
pub fn trace_report(
    preset: &VoicePreset,
    notes: &[ScriptNote],
    velocity: u8,
    step: f64,
    until: Option<f64>,
) -> anyhow::Result<String> {
    if !(step.is_finite() && step > 0.0) {
        anyhow::bail!("--step must be a positive number of seconds");
    }
    if let Some(until) = until
        && !(until.is_finite() && until >= 0.0)
    {
        anyhow::bail!("--until must be a non-negative number of seconds");
    }

    let clock = ManualClock::new();
    let mut synth = preset
        .build_synth(RecordingBackend::new(), clock.clone())
        .with_context(|| format!("building synth from preset '{}'", preset.name))?;

    let mut out = String::new();
    writeln!(out, "Preset: {} ({} voices)", preset.name, synth.polyphony())?;
    writeln!(out)?;
    writeln!(out, "Notes:")?;

    let mut handles: Vec<Option<NoteHandle>> = vec![None; notes.len()];
    let mut last_time = 0.0f64;
    for (time, action) in schedule(notes) {
        clock.set(time);
        last_time = last_time.max(time);
        match action {
            Action::On(i) => {
                let handle = synth.note_on_midi(notes[i].note, velocity)?;
                let target = match (handle.voice_id(), handle.note_id()) {
                    (Some(voice), Some(note)) => format!("{voice} {note}"),
                    _ => "dropped (no voices)".to_string(),
                };
                writeln!(out, "  {time:7.3}s  on  {:3} -> {target}", notes[i].note)?;
                handles[i] = Some(handle);
            }
            Action::Off(i) => {
                let released = handles[i].take().is_some_and(|h| synth.note_off(h));
                let outcome = if released {
                    "released"
                } else {
                    "no longer owns a voice"
                };
                writeln!(out, "  {time:7.3}s  off {:3} -> {outcome}", notes[i].note)?;
            }
        }
    }

    let until = until.unwrap_or(last_time + preset.envelope.release);
    let samples = (until / step).floor();
    if samples >= MAX_SAMPLES as f64 {
        anyhow::bail!(
            "sampling to {until:.3}s every {step}s exceeds {MAX_SAMPLES} samples; raise --step or lower --until"
        );
    }
    let samples = samples as usize;

    for voice in synth.voices() {
        let Some(trigger) = voice.last_trigger() else {
            continue;
        };
        writeln!(out)?;
        writeln!(
            out,
            "{} (last {}, {:.2} Hz, {:?} at {until:.3}s)",
            voice.id(),
            trigger.note_id,
            trigger.frequency,
            voice.state(until)
        )?;

        writeln!(out, "  gain events:")?;
        for event in voice.gain().events() {
            writeln!(out, "    {}", format_event(event))?;
        }

        writeln!(out, "  gain curve:")?;
        for k in 0..=samples {
            let t = k as f64 * step;
            writeln!(out, "    {t:7.3}s  {:.4}", voice.gain().value_at(t))?;
        }
    }

    Ok(out)
}

fn format_event(event: &AutomationEvent) -> String {
    match *event {
        AutomationEvent::SetValue { value, time } => {
            format!("{time:7.3}s  set     {value:.4}")
        }
        AutomationEvent::LinearRamp { value, time } => {
            format!("{time:7.3}s  ramp -> {value:.4}")
        }
        AutomationEvent::SetTarget {
            target,
            time,
            time_constant,
        } => format!("{time:7.3}s  target  {target:.4} (tau {time_constant:.4}s)"),
    }
}
