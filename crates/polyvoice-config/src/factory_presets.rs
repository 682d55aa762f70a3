//! Factory presets bundled with the polyvoice library.
//!
//! These presets are always available without external files. They cover
//! each voice variant and serve as starting points for user presets.

use std::path::Path;

use crate::{ConfigError, VoicePreset};

/// Array of factory preset names for external access.
pub static FACTORY_PRESET_NAMES: &[&str] = &["init", "pluck", "pad", "supersaw", "hat", "organ"];

/// TOML content for factory presets, embedded at compile time.
static FACTORY_PRESETS_TOML: &[(&str, &str)] = &[
    ("init", INIT_PRESET),
    ("pluck", PLUCK_PRESET),
    ("pad", PAD_PRESET),
    ("supersaw", SUPERSAW_PRESET),
    ("hat", HAT_PRESET),
    ("organ", ORGAN_PRESET),
];

/// Initialization preset - library defaults.
const INIT_PRESET: &str = r#"
name = "Init"
description = "Single sine oscillator with default envelope"
polyphony = 8

[voice]
kind = "oscillator"

[envelope]
audio_delay = 0.0
attack = 0.01
decay = 0.1
sustain = 0.7
release = 0.2

[waveform]
kind = "sine"
"#;

/// Short percussive triangle.
const PLUCK_PRESET: &str = r#"
name = "Pluck"
description = "Fast attack, quick decay to silence"
polyphony = 12

[voice]
kind = "oscillator"

[envelope]
attack = 0.002
decay = 0.25
sustain = 0.0
release = 0.1

[waveform]
kind = "triangle"
"#;

/// Slow swelling unison pad.
const PAD_PRESET: &str = r#"
name = "Pad"
description = "Slow attack and long release over a gently detuned stack"
polyphony = 6

[voice]
kind = "unison"
count = 3
spread_cents = 8.0

[envelope]
attack = 0.8
decay = 1.0
sustain = 0.8
release = 2.5

[waveform]
kind = "triangle"
"#;

/// Classic detuned sawtooth stack.
const SUPERSAW_PRESET: &str = r#"
name = "Supersaw"
description = "Seven detuned sawtooths"
polyphony = 8

[voice]
kind = "unison"
count = 7
spread_cents = 25.0

[envelope]
attack = 0.02
decay = 0.3
sustain = 0.8
release = 0.5

[waveform]
kind = "sawtooth"
"#;

/// Noise hi-hat.
const HAT_PRESET: &str = r#"
name = "Hat"
description = "Short noise burst"
polyphony = 4

[voice]
kind = "noise"

[envelope]
attack = 0.001
decay = 0.05
sustain = 0.0
release = 0.03
"#;

/// Additive drawbar-style tone.
const ORGAN_PRESET: &str = r#"
name = "Organ"
description = "Custom harmonic series with an instant gate"
polyphony = 10

[voice]
kind = "oscillator"

[envelope]
attack = 0.005
decay = 0.0
sustain = 1.0
release = 0.05

[waveform]
kind = "custom"
real = [0.0, 0.0, 0.0, 0.0, 0.0]
imag = [0.0, 1.0, 0.5, 0.0, 0.25]
"#;

/// Get all factory presets.
///
/// # Example
///
/// ```rust
/// use polyvoice_config::factory_presets;
///
/// for preset in &factory_presets() {
///     println!("  - {}: {}", preset.name, preset.description.as_deref().unwrap_or(""));
/// }
/// ```
pub fn factory_presets() -> Vec<VoicePreset> {
    FACTORY_PRESETS_TOML
        .iter()
        .filter_map(|(_, toml)| VoicePreset::from_toml(toml).ok())
        .collect()
}

/// Get a factory preset by name.
///
/// Matches the internal identifier or the preset's display name,
/// case-insensitively.
///
/// # Example
///
/// ```rust
/// use polyvoice_config::get_factory_preset;
///
/// let preset = get_factory_preset("Supersaw").unwrap();
/// assert_eq!(preset.polyphony, 8);
/// ```
pub fn get_factory_preset(name: &str) -> Option<VoicePreset> {
    let name_lower = name.to_lowercase();

    for (preset_name, toml) in FACTORY_PRESETS_TOML {
        if preset_name.to_lowercase() == name_lower {
            return VoicePreset::from_toml(toml).ok();
        }
    }

    // Also try matching against the preset's display name
    for (_, toml) in FACTORY_PRESETS_TOML {
        if let Ok(preset) = VoicePreset::from_toml(toml)
            && preset.name.to_lowercase() == name_lower
        {
            return Some(preset);
        }
    }

    None
}

/// Get the internal identifiers of all factory presets.
pub fn factory_preset_names() -> Vec<&'static str> {
    FACTORY_PRESETS_TOML.iter().map(|(name, _)| *name).collect()
}

/// Check if a name refers to a factory preset (case-insensitive).
///
/// ```rust
/// use polyvoice_config::is_factory_preset;
///
/// assert!(is_factory_preset("pad"));
/// assert!(is_factory_preset("PAD"));
/// assert!(!is_factory_preset("my_custom_preset"));
/// ```
pub fn is_factory_preset(name: &str) -> bool {
    get_factory_preset(name).is_some()
}

/// Resolve a preset by file path or factory preset name.
///
/// An existing path is loaded as a preset file; anything else is looked up
/// with [`get_factory_preset`].
pub fn find_preset(name_or_path: &str) -> Result<VoicePreset, ConfigError> {
    let path = Path::new(name_or_path);
    if path.is_file() {
        return VoicePreset::load(path);
    }

    get_factory_preset(name_or_path)
        .ok_or_else(|| ConfigError::PresetNotFound(name_or_path.to_string()))
}
