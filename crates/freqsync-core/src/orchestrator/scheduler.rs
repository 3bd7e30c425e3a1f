use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::Orchestrator;
use crate::error::Result;
use crate::events::UpdateEvent;
use crate::types::CycleReport;

/// Fixed-interval cycle loop with an in-flight guard.
///
/// The first cycle starts immediately. Ticks that fall due while a cycle is
/// still running are dropped, never queued behind it.
pub struct Scheduler {
    orchestrator: Arc<Orchestrator>,
    period: Duration,
    in_flight: AtomicBool,
}

impl Scheduler {
    pub fn new(orchestrator: Arc<Orchestrator>, period: Duration) -> Self {
        Self {
            orchestrator,
            period,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_running_cycle(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run cycles until `cancel` fires. Returns the number of cycles started.
    pub async fn run(&self, cancel: CancellationToken) -> u64 {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut cycles = 0;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            if self.try_cycle(&cancel).await.is_some() {
                cycles += 1;
            }
            if cancel.is_cancelled() {
                break;
            }
            tracing::debug!(
                next_in_secs = self.period.as_secs(),
                "waiting for next check"
            );
        }

        tracing::info!(cycles, "scheduler stopped");
        cycles
    }

    /// Start a cycle unless one is already running.
    ///
    /// Returns `None` (and emits `cycle_skipped`) when the guard is held.
    /// Configuration errors are logged here and handed back to the caller.
    pub async fn try_cycle(&self, cancel: &CancellationToken) -> Option<Result<CycleReport>> {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            let reason = "previous cycle still running".to_string();
            tracing::warn!(%reason, "skipping scheduled cycle");
            self.orchestrator
                .notifier()
                .notify(&UpdateEvent::CycleSkipped { reason })
                .await;
            return None;
        };

        let result = self.orchestrator.run_cycle(cancel).await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "cycle failed; retrying at next interval");
        }
        Some(result)
    }
}

struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
