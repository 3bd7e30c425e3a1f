use anyhow::Context;
use freqsync_core::config::Config;
use std::path::Path;

use crate::output::print_json;

pub fn run(path: &Path, force: bool, json: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        );
    }

    let config = Config::starter();
    config
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;

    if json {
        print_json(&serde_json::json!({
            "path": path.display().to_string(),
            "config": config,
        }))?;
    } else {
        println!("  created: {}", path.display());
        println!();
        println!(
            "Tracking {} file(s) and {} folder(s) from {}.",
            config.static_files.len(),
            config.dynamic_folders.len(),
            config.source.describe()
        );
        println!("Edit local paths, restart and telegram settings, then run `freqsync check --dry-run`.");
    }
    Ok(())
}
