use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// FileKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Strategy,
    Config,
}

impl FileKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Strategy => "strategy",
            FileKind::Config => "config",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TrackedFile
// ---------------------------------------------------------------------------

/// A remote artifact paired with the local path it is installed to.
///
/// Built fresh at the start of every cycle and dropped at its end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedFile {
    pub name: String,
    pub local_path: PathBuf,
    pub remote_locator: String,
    pub kind: FileKind,
    pub uses_version_check: bool,
    /// Extension allow-list of the folder this entry was discovered in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_extensions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Remote content identifier (git blob SHA for GitHub listings).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
}

impl TrackedFile {
    pub fn strategy(&self) -> DetectionStrategy {
        if self.uses_version_check && self.kind == FileKind::Strategy {
            DetectionStrategy::Version
        } else {
            DetectionStrategy::Hash
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStrategy {
    Version,
    Hash,
}

/// One item of a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub content_id: Option<String>,
    pub is_file: bool,
}

// ---------------------------------------------------------------------------
// Verdict / ApplyResult
// ---------------------------------------------------------------------------

/// Local vs. remote comparison for one tracked file.
///
/// `needs_update` is only ever true when both signatures were obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub file: TrackedFile,
    pub strategy: DetectionStrategy,
    pub needs_update: bool,
    pub local_signature: Option<String>,
    pub remote_signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyResult {
    pub file: TrackedFile,
    pub succeeded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes_written: Option<u64>,
}

impl ApplyResult {
    pub fn success(file: TrackedFile, bytes_written: u64) -> Self {
        Self {
            file,
            succeeded: true,
            error: None,
            bytes_written: Some(bytes_written),
        }
    }

    pub fn failure(file: TrackedFile, error: impl ToString) -> Self {
        Self {
            file,
            succeeded: false,
            error: Some(error.to_string()),
            bytes_written: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Restart
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestartStep {
    Stop,
    Start,
}

impl fmt::Display for RestartStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestartStep::Stop => f.write_str("stop"),
            RestartStep::Start => f.write_str("start"),
        }
    }
}

/// Result of a stop-then-start service restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestartOutcome {
    pub succeeded: bool,
    /// The step that failed, if any. A stop failure means start never ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<RestartStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub stop_output: String,
    #[serde(default)]
    pub start_output: String,
    pub duration_ms: u64,
}

// ---------------------------------------------------------------------------
// Cycle
// ---------------------------------------------------------------------------

/// Orchestrator states, in the order a full cycle visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    Idle,
    BuildingCatalog,
    Detecting,
    Applying,
    Restarting,
}

impl CyclePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            CyclePhase::Idle => "idle",
            CyclePhase::BuildingCatalog => "building_catalog",
            CyclePhase::Detecting => "detecting",
            CyclePhase::Applying => "applying",
            CyclePhase::Restarting => "restarting",
        }
    }
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleSummary {
    pub total_files: usize,
    pub stale_count: usize,
    pub updated_count: usize,
    pub failed_count: usize,
    pub restart_performed: bool,
    pub timestamp: DateTime<Utc>,
}

impl CycleSummary {
    /// Share of tracked files that were stale, as a percentage.
    pub fn stale_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            self.stale_count as f64 / self.total_files as f64 * 100.0
        }
    }
}

/// Everything one cycle produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub summary: CycleSummary,
    pub verdicts: Vec<Verdict>,
    pub results: Vec<ApplyResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart: Option<RestartOutcome>,
    /// States visited, starting and ending with `idle`.
    pub phases: Vec<CyclePhase>,
    /// Shutdown was requested before the cycle finished its apply phase.
    #[serde(default)]
    pub cancelled: bool,
}

impl CycleReport {
    pub fn entered(&self, phase: CyclePhase) -> bool {
        self.phases.contains(&phase)
    }
}
