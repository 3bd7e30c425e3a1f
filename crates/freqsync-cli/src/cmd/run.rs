use std::path::Path;
use std::sync::Arc;

use freqsync_core::config::Config;
use freqsync_core::orchestrator::Scheduler;

use super::{build_orchestrator, load_config, shutdown_token};

pub fn run(path: &Path) -> anyhow::Result<()> {
    let config = load_config(path)?;
    for w in config.validate() {
        tracing::warn!("{}", w.message);
    }
    log_banner(path, &config);

    let period = config.interval();
    let orchestrator = Arc::new(build_orchestrator(config)?);
    let scheduler = Scheduler::new(orchestrator, period);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let cancel = shutdown_token();
        scheduler.run(cancel).await;
    });
    Ok(())
}

fn log_banner(path: &Path, config: &Config) {
    let workdir = config
        .restart
        .working_dir
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| ".".to_string());
    let proxy = if config.http.proxy.enabled {
        config.http.proxy.url()
    } else {
        "off".to_string()
    };
    tracing::info!(
        config = %path.display(),
        source = %config.source.describe(),
        interval_minutes = config.check_interval_minutes,
        "freqsync {} starting",
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!(
        restart = config.restart.enabled,
        workdir = %workdir,
        proxy = %proxy,
        telegram = config.telegram.is_usable(),
        "service settings"
    );
    tracing::info!(static_files = config.static_files.len(), "tracking static files");
    for folder in &config.dynamic_folders {
        tracing::info!(
            folder = %folder.name,
            extensions = %folder.file_extensions.join(", "),
            "tracking folder"
        );
    }
}
