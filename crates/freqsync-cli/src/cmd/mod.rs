pub mod catalog;
pub mod check;
pub mod config;
pub mod init;
pub mod run;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use freqsync_core::config::Config;
use freqsync_core::orchestrator::Orchestrator;
use freqsync_core::process::ShellRunner;
use freqsync_core::transport;
use tokio_util::sync::CancellationToken;

use crate::notify;

pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = Config::load(path).context("failed to load config")?;
    config.ensure_valid()?;
    Ok(config)
}

/// Wire the production transport, shell runner and notifiers around `config`.
pub fn build_orchestrator(config: Config) -> anyhow::Result<Orchestrator> {
    let transport = transport::for_config(&config).context("failed to set up transport")?;
    let runner = Arc::new(ShellRunner::new(config.restart.working_dir.as_deref()));
    let notifier = Arc::new(notify::from_config(&config)?);
    Ok(Orchestrator::new(Arc::new(config), transport, runner, notifier))
}

/// Token cancelled on Ctrl-C (and SIGTERM on unix). Must be called inside a runtime.
pub fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("shutdown requested; finishing current file operation");
        trigger.cancel();
    });
    token
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "cannot listen for SIGTERM; only Ctrl-C stops the daemon");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
