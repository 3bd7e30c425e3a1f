//! Remote access seam.
//!
//! The change detector, catalog and applier only ever talk to a
//! [`Transport`]. Two implementations exist:
//! - [`HttpTransport`]: GitHub raw files and the contents API over `reqwest`.
//! - [`DirectoryTransport`]: a local mirror of the repository layout.

mod fs;
mod http;

pub use fs::DirectoryTransport;
pub use http::HttpTransport;

use crate::config::{Config, SourceConfig};
use crate::error::Result;
use crate::types::RemoteEntry;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the full content at `locator`.
    async fn fetch_bytes(&self, locator: &str) -> Result<Vec<u8>>;

    /// Fetch the content at `locator` as text (lossy UTF-8).
    async fn fetch_text(&self, locator: &str) -> Result<String> {
        let bytes = self.fetch_bytes(locator).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// List the directory at `locator`.
    async fn list_directory(&self, locator: &str) -> Result<Vec<RemoteEntry>>;
}

/// Build the transport matching the configured source.
pub fn for_config(config: &Config) -> Result<Arc<dyn Transport>> {
    match &config.source {
        SourceConfig::Github { .. } => Ok(Arc::new(HttpTransport::new(&config.http)?)),
        SourceConfig::Directory { .. } => Ok(Arc::new(DirectoryTransport::new())),
    }
}
