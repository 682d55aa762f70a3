//! CLI command implementations.

pub mod presets;
pub mod trace;

use anyhow::Context;
use polyvoice_config::VoicePreset;

/// Resolve a factory preset name or a path to a preset file.
pub fn find_preset(name: &str) -> anyhow::Result<VoicePreset> {
    polyvoice_config::find_preset(name).with_context(|| format!("resolving preset '{name}'"))
}
