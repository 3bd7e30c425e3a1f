use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use freqsync_core::config::{Config, WarnLevel};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Validate the config for common mistakes
    Validate,

    /// Print the config with relative paths resolved
    Show,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(path: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Validate => validate(path, json),
        ConfigSubcommand::Show => show(path, json),
    }
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(path: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(path).context("failed to load config")?;
    let warnings = config.validate();

    if json {
        let value = serde_json::json!({
            "path": path.display().to_string(),
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(path: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(path).context("failed to load config")?;
    if json {
        print_json(&config)?;
    } else {
        println!("# {}", path.display());
        print!("{}", serde_yaml::to_string(&config)?);
    }
    Ok(())
}
