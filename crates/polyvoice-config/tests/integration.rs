//! Integration tests for polyvoice-config.
//!
//! These tests verify preset files end to end: disk round trips, factory
//! presets driving a synth, and validation errors surfacing through
//! `build_synth`.

use polyvoice_config::{
    ConfigError, ValidationError, VoiceConfig, VoicePreset, WaveformConfig, factory_presets,
    find_preset, get_factory_preset,
};
use polyvoice_core::ManualClock;
use polyvoice_synth::{RecordingBackend, SourceKind, VoiceKind, VoiceParams, WaveformKind};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// File round trips
// ---------------------------------------------------------------------------

#[test]
fn test_save_and_load_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("lead.toml");

    let params = VoiceParams::default()
        .with_attack(0.05)
        .with_release(1.5)
        .with_sustain(0.5);
    let preset = VoicePreset::new("Lead")
        .with_description("Saved from a test")
        .with_polyphony(5)
        .with_kind(VoiceKind::Unison {
            count: 4,
            spread_cents: 12.0,
        })
        .with_voice_params(&params);

    preset.save(&path).unwrap();
    assert!(path.exists());

    let loaded = VoicePreset::load(&path).unwrap();
    assert_eq!(loaded, preset);
    assert_eq!(loaded.to_voice_params().unwrap(), params);
}

#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = VoicePreset::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
}

#[test]
fn test_load_malformed_toml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "name = \"Broken\"\n[voice]\nkind = \"choir\"\n").unwrap();

    assert!(matches!(
        VoicePreset::load(&path),
        Err(ConfigError::TomlParse(_))
    ));
}

// ---------------------------------------------------------------------------
// Factory presets driving a synth
// ---------------------------------------------------------------------------

#[test]
fn test_factory_presets_play_notes() {
    for preset in factory_presets() {
        let clock = ManualClock::new();
        let mut synth = preset
            .build_synth(RecordingBackend::new(), clock.clone())
            .unwrap();

        let note = synth.note_on_midi(69, 127).unwrap();
        assert!(synth.is_sounding(&note), "preset '{}'", preset.name);

        clock.advance(0.5);
        assert!(synth.note_off(note), "preset '{}'", preset.name);
        assert!(!synth.is_sounding(&note));
    }
}

#[test]
fn test_hat_uses_noise_sources() {
    let preset = get_factory_preset("hat").unwrap();
    assert_eq!(preset.voice, VoiceConfig::Noise);

    let synth = preset
        .build_synth(RecordingBackend::new(), ManualClock::new())
        .unwrap();
    for voice in synth.voices() {
        assert_eq!(voice.sources().len(), 1);
        assert_eq!(voice.sources()[0].kind(), SourceKind::Noise);
    }
}

#[test]
fn test_organ_uses_custom_waveform() {
    let preset = get_factory_preset("organ").unwrap();
    let params = preset.to_voice_params().unwrap();

    assert_eq!(params.waveform.kind, WaveformKind::Custom);
    assert!(params.waveform.periodic_wave.is_some());
}

// ---------------------------------------------------------------------------
// Validation through build_synth
// ---------------------------------------------------------------------------

#[test]
fn test_build_synth_rejects_invalid_preset() {
    let mut preset = VoicePreset::new("Broken");
    preset.envelope.release = -0.5;

    let err = preset
        .build_synth(RecordingBackend::new(), ManualClock::new())
        .unwrap_err();

    assert!(matches!(
        err,
        ConfigError::Validation(ValidationError::OutOfRange { ref param, .. }) if param == "envelope.release"
    ));
}

#[test]
fn test_build_synth_rejects_custom_without_terms() {
    let mut preset = VoicePreset::new("Empty Custom");
    preset.waveform = WaveformConfig::named(WaveformKind::Custom);

    let err = preset
        .build_synth(RecordingBackend::new(), ManualClock::new())
        .unwrap_err();

    assert!(matches!(
        err,
        ConfigError::Validation(ValidationError::InvalidFormat { ref param, .. }) if param == "waveform"
    ));
}

#[test]
fn test_zero_polyphony_preset_builds_silent_synth() {
    let preset = VoicePreset::new("Mute").with_polyphony(0);
    let mut synth = preset
        .build_synth(RecordingBackend::new(), ManualClock::new())
        .unwrap();

    let note = synth.note_on(440.0, 1.0).unwrap();
    assert!(note.is_detached());
    assert!(!synth.note_off(note));
}

#[test]
fn test_find_preset_prefers_existing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pad.toml");
    VoicePreset::new("My Pad").with_polyphony(2).save(&path).unwrap();

    let preset = find_preset(path.to_str().unwrap()).unwrap();
    assert_eq!(preset.name, "My Pad");

    assert_eq!(find_preset("pad").unwrap().name, "Pad");
    assert!(matches!(
        find_preset(dir.path().join("missing.toml").to_str().unwrap()),
        Err(ConfigError::PresetNotFound(_))
    ));
}
