//! Typed events handed to notification channels.
//!
//! The core only emits plain data; formatting and delivery belong to the
//! [`Notifier`] implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::types::{CycleSummary, DetectionStrategy, RestartOutcome, TrackedFile};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UpdateEvent {
    UpdateAvailable {
        file: TrackedFile,
        strategy: DetectionStrategy,
        local_signature: Option<String>,
        remote_signature: Option<String>,
    },
    UpdateApplied {
        file: TrackedFile,
        bytes_written: u64,
    },
    UpdateFailed {
        file: TrackedFile,
        error: String,
    },
    RestartCompleted {
        outcome: RestartOutcome,
    },
    CycleCompleted {
        summary: CycleSummary,
    },
    /// The cycle could not run at all (configuration error).
    CycleAborted {
        error: String,
    },
    /// A scheduled cycle was not started.
    CycleSkipped {
        reason: String,
    },
}

impl UpdateEvent {
    pub fn name(&self) -> &'static str {
        match self {
            UpdateEvent::UpdateAvailable { .. } => "update_available",
            UpdateEvent::UpdateApplied { .. } => "update_applied",
            UpdateEvent::UpdateFailed { .. } => "update_failed",
            UpdateEvent::RestartCompleted { .. } => "restart_completed",
            UpdateEvent::CycleCompleted { .. } => "cycle_completed",
            UpdateEvent::CycleAborted { .. } => "cycle_aborted",
            UpdateEvent::CycleSkipped { .. } => "cycle_skipped",
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one event. Delivery problems are the notifier's to log.
    async fn notify(&self, event: &UpdateEvent);
}

/// Forwards every event to each inner notifier, in order.
#[derive(Default, Clone)]
pub struct FanoutNotifier {
    inner: Vec<Arc<dyn Notifier>>,
}

impl FanoutNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.inner.push(notifier);
        self
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl std::fmt::Debug for FanoutNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutNotifier")
            .field("notifiers", &self.inner.len())
            .finish()
    }
}

#[async_trait]
impl Notifier for FanoutNotifier {
    async fn notify(&self, event: &UpdateEvent) {
        for n in &self.inner {
            n.notify(event).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingNotifier;

    #[tokio::test]
    async fn fanout_delivers_to_all() {
        let a = Arc::new(RecordingNotifier::default());
        let b = Arc::new(RecordingNotifier::default());
        let fanout = FanoutNotifier::new().with(a.clone()).with(b.clone());
        assert_eq!(fanout.len(), 2);

        fanout
            .notify(&UpdateEvent::CycleSkipped {
                reason: "previous cycle still running".to_string(),
            })
            .await;
        assert_eq!(a.names(), ["cycle_skipped"]);
        assert_eq!(b.names(), ["cycle_skipped"]);
    }

    #[test]
    fn events_serialize_with_tag() {
        let json = serde_json::to_value(UpdateEvent::CycleAborted {
            error: "bad".to_string(),
        })
        .unwrap();
        assert_eq!(json["event"], "cycle_aborted");
        assert_eq!(json["error"], "bad");
    }
}
