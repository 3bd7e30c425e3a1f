use super::Transport;
use crate::error::{Result, SyncError};
use crate::types::RemoteEntry;
use async_trait::async_trait;

/// Serves a source that is a plain directory on disk.
#[derive(Debug, Default, Clone)]
pub struct DirectoryTransport;

impl DirectoryTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for DirectoryTransport {
    async fn fetch_bytes(&self, locator: &str) -> Result<Vec<u8>> {
        tokio::fs::read(locator)
            .await
            .map_err(|e| SyncError::network(locator, e))
    }

    async fn list_directory(&self, locator: &str) -> Result<Vec<RemoteEntry>> {
        let meta = tokio::fs::metadata(locator)
            .await
            .map_err(|e| SyncError::network(locator, e))?;
        if !meta.is_dir() {
            return Err(SyncError::UnexpectedListing(locator.to_string()));
        }
        let mut dir = tokio::fs::read_dir(locator)
            .await
            .map_err(|e| SyncError::network(locator, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| SyncError::network(locator, e))?
        {
            let meta = entry
                .metadata()
                .await
                .map_err(|e| SyncError::network(locator, e))?;
            entries.push(RemoteEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                size: meta.is_file().then(|| meta.len()),
                content_id: None,
                is_file: meta.is_file(),
            });
        }
        // read_dir order is platform dependent
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
