use async_trait::async_trait;
use freqsync_core::events::{Notifier, UpdateEvent};

use crate::output::signature;

/// Writes every event through `tracing`.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: &UpdateEvent) {
        match event {
            UpdateEvent::UpdateAvailable {
                file,
                strategy,
                local_signature,
                remote_signature,
            } => tracing::info!(
                file = %file.name,
                current = %signature(*strategy, local_signature.as_deref()),
                remote = %signature(*strategy, remote_signature.as_deref()),
                "update available"
            ),
            UpdateEvent::UpdateApplied {
                file,
                bytes_written,
            } => tracing::info!(file = %file.name, bytes = bytes_written, "update applied"),
            UpdateEvent::UpdateFailed { file, error } => {
                tracing::error!(file = %file.name, %error, "update failed")
            }
            UpdateEvent::RestartCompleted { outcome } if outcome.succeeded => {
                tracing::info!(duration_ms = outcome.duration_ms, "restart completed")
            }
            UpdateEvent::RestartCompleted { outcome } => tracing::error!(
                step = ?outcome.failed_step,
                error = outcome.error.as_deref().unwrap_or("unknown"),
                "restart failed"
            ),
            UpdateEvent::CycleCompleted { summary } => tracing::info!(
                total = summary.total_files,
                stale = summary.stale_count,
                updated = summary.updated_count,
                failed = summary.failed_count,
                rate = %format!("{:.1}%", summary.stale_rate()),
                "check complete"
            ),
            UpdateEvent::CycleAborted { error } => tracing::error!(%error, "check aborted"),
            UpdateEvent::CycleSkipped { reason } => tracing::warn!(%reason, "check skipped"),
        }
    }
}
