//! Two-phase restart of the service that consumes the tracked files.

use std::time::Instant;

use crate::config::RestartConfig;
use crate::error::SyncError;
use crate::process::{CommandOutput, CommandRunner};
use crate::types::{RestartOutcome, RestartStep};

/// Run the stop command, then the start command.
///
/// A failed stop aborts before start is attempted. Failures are returned in
/// the outcome rather than as an error.
pub async fn restart_service(cfg: &RestartConfig, runner: &dyn CommandRunner) -> RestartOutcome {
    let started = Instant::now();
    let mut outcome = RestartOutcome {
        succeeded: false,
        failed_step: None,
        error: None,
        stop_output: String::new(),
        start_output: String::new(),
        duration_ms: 0,
    };

    tracing::info!(command = %cfg.stop_command, "stopping service");
    match run_step(runner, &cfg.stop_command).await {
        Ok(out) => outcome.stop_output = out.stdout,
        Err(e) => {
            tracing::error!(error = %e, "stop command failed; not attempting start");
            outcome.failed_step = Some(RestartStep::Stop);
            outcome.error = Some(e.to_string());
            outcome.duration_ms = elapsed_ms(started);
            return outcome;
        }
    }

    tracing::info!(command = %cfg.start_command, "starting service");
    match run_step(runner, &cfg.start_command).await {
        Ok(out) => {
            outcome.start_output = out.stdout;
            outcome.succeeded = true;
            tracing::info!("service restarted");
        }
        Err(e) => {
            tracing::error!(error = %e, "start command failed; service may be down");
            outcome.failed_step = Some(RestartStep::Start);
            outcome.error = Some(e.to_string());
        }
    }
    outcome.duration_ms = elapsed_ms(started);
    outcome
}

async fn run_step(
    runner: &dyn CommandRunner,
    command: &str,
) -> crate::error::Result<CommandOutput> {
    let out = runner.run_command(command).await?;
    if !out.success() {
        return Err(SyncError::CommandFailed {
            command: command.to_string(),
            code: out.exit_code,
            stderr: out.stderr.trim().chars().take(500).collect(),
        });
    }
    Ok(out)
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
