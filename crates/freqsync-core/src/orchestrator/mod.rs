//! Update cycle driver.
//!
//! One cycle walks `idle → building_catalog → detecting → applying →
//! restarting? → idle`. The [`Orchestrator`] owns the per-cycle file,
//! verdict and result lists; nothing survives from one cycle to the next.
//! [`Scheduler`] repeats cycles on a fixed interval.

pub mod scheduler;

pub use scheduler::Scheduler;

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::apply::apply;
use crate::catalog::build_catalog;
use crate::config::Config;
use crate::detect::detect_all;
use crate::error::Result;
use crate::events::{Notifier, UpdateEvent};
use crate::process::CommandRunner;
use crate::restart::restart_service;
use crate::transport::Transport;
use crate::types::{
    ApplyResult, CyclePhase, CycleReport, CycleSummary, RestartOutcome, TrackedFile, Verdict,
};

pub struct Orchestrator {
    config: Arc<Config>,
    transport: Arc<dyn Transport>,
    runner: Arc<dyn CommandRunner>,
    notifier: Arc<dyn Notifier>,
}

impl Orchestrator {
    pub fn new(
        config: Arc<Config>,
        transport: Arc<dyn Transport>,
        runner: Arc<dyn CommandRunner>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            transport,
            runner,
            notifier,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Resolve the tracked files without comparing anything.
    pub async fn catalog(&self) -> Result<Vec<TrackedFile>> {
        build_catalog(&self.config, self.transport.as_ref()).await
    }

    /// Catalog and detection only. Nothing is written and no events are sent.
    pub async fn detect_only(&self) -> Result<Vec<Verdict>> {
        let files = self.catalog().await?;
        Ok(detect_all(&files, self.transport.as_ref(), self.config.concurrency.detect).await)
    }

    /// Run one full cycle.
    ///
    /// Only a configuration error is returned as `Err` (after a
    /// `cycle_aborted` event). Network, filesystem and process failures are
    /// recorded in the report. When `cancel` fires, the file operation in
    /// progress finishes, remaining applies are skipped and the report is
    /// marked `cancelled`.
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> Result<CycleReport> {
        let mut phases = vec![CyclePhase::Idle, CyclePhase::BuildingCatalog];
        tracing::info!(source = %self.config.source.describe(), "cycle started");

        let files = match self.catalog().await {
            Ok(files) => files,
            Err(e) => {
                tracing::error!(error = %e, "cycle aborted");
                self.notifier
                    .notify(&UpdateEvent::CycleAborted {
                        error: e.to_string(),
                    })
                    .await;
                return Err(e);
            }
        };

        phases.push(CyclePhase::Detecting);
        let mut cancelled = false;
        let verdicts = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                cancelled = true;
                Vec::new()
            }
            v = detect_all(&files, self.transport.as_ref(), self.config.concurrency.detect) => v,
        };

        let stale: Vec<&Verdict> = verdicts.iter().filter(|v| v.needs_update).collect();
        tracing::info!(
            total = files.len(),
            stale = stale.len(),
            "detection finished"
        );
        for v in &stale {
            self.notifier
                .notify(&UpdateEvent::UpdateAvailable {
                    file: v.file.clone(),
                    strategy: v.strategy,
                    local_signature: v.local_signature.clone(),
                    remote_signature: v.remote_signature.clone(),
                })
                .await;
        }

        let mut results: Vec<ApplyResult> = Vec::with_capacity(stale.len());
        if !stale.is_empty() {
            phases.push(CyclePhase::Applying);
        }
        for v in &stale {
            if cancel.is_cancelled() {
                tracing::warn!(
                    remaining = stale.len() - results.len(),
                    "shutdown requested; skipping remaining updates"
                );
                cancelled = true;
                break;
            }
            let result = apply(&v.file, self.transport.as_ref()).await;
            let event = match (&result.error, result.bytes_written) {
                (None, Some(bytes_written)) => UpdateEvent::UpdateApplied {
                    file: result.file.clone(),
                    bytes_written,
                },
                (error, _) => UpdateEvent::UpdateFailed {
                    file: result.file.clone(),
                    error: error.clone().unwrap_or_default(),
                },
            };
            self.notifier.notify(&event).await;
            results.push(result);
        }

        let updated_count = results.iter().filter(|r| r.succeeded).count();
        let failed_count = results.len() - updated_count;
        let restart = self.maybe_restart(updated_count, &mut phases).await;

        phases.push(CyclePhase::Idle);
        let summary = CycleSummary {
            total_files: files.len(),
            stale_count: stale.len(),
            updated_count,
            failed_count,
            restart_performed: restart.as_ref().is_some_and(|r| r.succeeded),
            timestamp: Utc::now(),
        };
        tracing::info!(
            total = summary.total_files,
            stale = summary.stale_count,
            updated = summary.updated_count,
            failed = summary.failed_count,
            restarted = summary.restart_performed,
            cancelled,
            "cycle completed"
        );
        self.notifier
            .notify(&UpdateEvent::CycleCompleted {
                summary: summary.clone(),
            })
            .await;

        Ok(CycleReport {
            summary,
            verdicts,
            results,
            restart,
            phases,
            cancelled,
        })
    }

    async fn maybe_restart(
        &self,
        updated_count: usize,
        phases: &mut Vec<CyclePhase>,
    ) -> Option<RestartOutcome> {
        if updated_count == 0 {
            return None;
        }
        if !self.config.restart.enabled {
            tracing::info!(updated = updated_count, "restart disabled; not restarting");
            return None;
        }
        phases.push(CyclePhase::Restarting);
        let outcome = restart_service(&self.config.restart, self.runner.as_ref()).await;
        self.notifier
            .notify(&UpdateEvent::RestartCompleted {
                outcome: outcome.clone(),
            })
            .await;
        Some(outcome)
    }
}
