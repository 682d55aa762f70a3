//! Preset commands.
//!
//! Lists the factory presets and prints the details of one preset.

use clap::{Args, Subcommand};
use polyvoice_config::{VoiceConfig, VoicePreset, factory_preset_names, get_factory_preset};

use super::find_preset;

#[derive(Args)]
pub struct PresetsArgs {
    #[command(subcommand)]
    command: PresetsCommand,
}

#[derive(Subcommand)]
enum PresetsCommand {
    /// List factory presets
    List,

    /// Show details of a preset
    Show {
        /// Factory preset name or path to a preset file
        name: String,

        /// Print the preset as TOML instead of a summary
        #[arg(long)]
        toml: bool,
    },
}

pub fn run(args: PresetsArgs) -> anyhow::Result<()> {
    match args.command {
        PresetsCommand::List => list_presets(),
        PresetsCommand::Show { name, toml } => show_preset(&name, toml),
    }
}

fn list_presets() -> anyhow::Result<()> {
    println!("Factory Presets:");
    println!("================");
    for id in factory_preset_names() {
        if let Some(preset) = get_factory_preset(id) {
            let desc = preset.description.as_deref().unwrap_or("");
            println!("  {id:12} {:8} - {desc}", voice_label(&preset.voice));
        }
    }
    println!();
    Ok(())
}

fn show_preset(name: &str, as_toml: bool) -> anyhow::Result<()> {
    let preset = find_preset(name)?;

    if as_toml {
        print!("{}", preset.to_toml()?);
        return Ok(());
    }

    print!("{}", describe(&preset));
    Ok(())
}

fn voice_label(voice: &VoiceConfig) -> &'static str {
    match voice {
        VoiceConfig::Oscillator => "osc",
        VoiceConfig::Unison { .. } => "unison",
        VoiceConfig::Noise => "noise",
    }
}

fn describe(preset: &VoicePreset) -> String {
    let mut out = String::new();
    out.push_str(&format!("Preset: {}\n", preset.name));
    out.push_str(&format!("{}\n\n", "=".repeat(8 + preset.name.len())));

    if let Some(desc) = &preset.description {
        out.push_str(&format!("Description: {desc}\n\n"));
    }

    out.push_str(&format!("Polyphony: {}\n", preset.polyphony));
    match preset.voice {
        VoiceConfig::Oscillator => out.push_str("Voice:     oscillator\n"),
        VoiceConfig::Unison {
            count,
            spread_cents,
        } => out.push_str(&format!(
            "Voice:     unison ({count} sources, {spread_cents} cents)\n"
        )),
        VoiceConfig::Noise => out.push_str("Voice:     noise\n"),
    }
    out.push_str(&format!("Waveform:  {}\n\n", preset.waveform.kind));

    let env = &preset.envelope;
    out.push_str("Envelope:\n");
    out.push_str(&format!("  delay   = {:.3} s\n", env.audio_delay));
    out.push_str(&format!("  attack  = {:.3} s\n", env.attack));
    out.push_str(&format!("  decay   = {:.3} s\n", env.decay));
    out.push_str(&format!("  sustain = {:.3}\n", env.sustain));
    out.push_str(&format!("  release = {:.3} s\n", env.release));
    out
}
