//! In-memory fakes for the transport, process and notification seams.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::TempDir;

use crate::error::{Result, SyncError};
use crate::events::{Notifier, UpdateEvent};
use crate::process::{CommandOutput, CommandRunner};
use crate::transport::Transport;
use crate::types::{FileKind, RemoteEntry, TrackedFile};

/// A tracked file whose local copy lives under `dir/local/` and whose
/// remote locator is `remote://{name}`.
pub fn tracked(dir: &TempDir, name: &str, kind: FileKind, version_check: bool) -> TrackedFile {
    let local = dir.path().join("local");
    std::fs::create_dir_all(&local).unwrap();
    TrackedFile {
        name: name.to_string(),
        local_path: local.join(name),
        remote_locator: format!("remote://{name}"),
        kind,
        uses_version_check: version_check,
        allowed_extensions: None,
        size: None,
        content_id: None,
    }
}

// ---------------------------------------------------------------------------
// FakeTransport
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeTransport {
    files: HashMap<String, Vec<u8>>,
    listings: HashMap<String, Vec<RemoteEntry>>,
    failing: HashSet<String>,
    fetched: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, locator: &str, body: impl Into<Vec<u8>>) -> Self {
        self.files.insert(locator.to_string(), body.into());
        self
    }

    pub fn with_fetch_error(mut self, locator: &str) -> Self {
        self.failing.insert(locator.to_string());
        self
    }

    pub fn with_listing(mut self, locator: &str, entries: Vec<RemoteEntry>) -> Self {
        self.listings.insert(locator.to_string(), entries);
        self
    }

    pub fn with_listing_error(mut self, locator: &str) -> Self {
        self.failing.insert(locator.to_string());
        self
    }

    /// Locators passed to `fetch_bytes`, in call order.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn fetch_bytes(&self, locator: &str) -> Result<Vec<u8>> {
        self.fetched.lock().unwrap().push(locator.to_string());
        if self.failing.contains(locator) {
            return Err(SyncError::network(locator, "connection reset"));
        }
        self.files
            .get(locator)
            .cloned()
            .ok_or_else(|| SyncError::network(locator, "404 Not Found"))
    }

    async fn list_directory(&self, locator: &str) -> Result<Vec<RemoteEntry>> {
        if self.failing.contains(locator) {
            return Err(SyncError::network(locator, "timed out"));
        }
        self.listings
            .get(locator)
            .cloned()
            .ok_or_else(|| SyncError::UnexpectedListing(locator.to_string()))
    }
}

// ---------------------------------------------------------------------------
// FakeRunner
// ---------------------------------------------------------------------------

/// Commands succeed with empty output unless scripted otherwise.
#[derive(Default)]
pub struct FakeRunner {
    outputs: HashMap<String, CommandOutput>,
    spawn_errors: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, command: &str, exit_code: i32, stdout: &str) -> Self {
        self.outputs.insert(
            command.to_string(),
            CommandOutput {
                exit_code,
                stdout: stdout.to_string(),
                stderr: if exit_code == 0 {
                    String::new()
                } else {
                    "boom".to_string()
                },
            },
        );
        self
    }

    pub fn with_spawn_error(mut self, command: &str) -> Self {
        self.spawn_errors.insert(command.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run_command(&self, command: &str) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(command.to_string());
        if self.spawn_errors.contains(command) {
            return Err(SyncError::Spawn {
                command: command.to_string(),
                message: "No such file or directory".to_string(),
            });
        }
        Ok(self.outputs.get(command).cloned().unwrap_or(CommandOutput {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        }))
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<UpdateEvent>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<UpdateEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|e| e.name()).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: &UpdateEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
