use super::Transport;
use crate::config::HttpConfig;
use crate::error::{Result, SyncError};
use crate::types::RemoteEntry;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use serde::Deserialize;

const GITHUB_API_ACCEPT: &str = "application/vnd.github.v3+json";

/// Raw-file and contents-API access over HTTP.
///
/// Every request shares the client's per-call timeout; a timeout surfaces
/// as an ordinary [`SyncError::Network`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    raw_headers: HeaderMap,
}

/// One element of a GitHub `contents` listing. Other fields are ignored.
#[derive(Debug, Deserialize)]
struct ContentsItem {
    name: String,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    sha: Option<String>,
    #[serde(rename = "type")]
    item_type: String,
}

impl HttpTransport {
    pub fn new(cfg: &HttpConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .user_agent(cfg.user_agent.clone());

        if cfg.proxy.enabled {
            let proxy = reqwest::Proxy::all(cfg.proxy.url()).map_err(|e| {
                SyncError::InvalidConfig(format!("proxy '{}': {e}", cfg.proxy.url()))
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| SyncError::InvalidConfig(format!("http client: {e}")))?;

        let mut raw_headers = HeaderMap::new();
        for (name, value) in &cfg.headers {
            let n = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| SyncError::InvalidConfig(format!("header name '{name}': {e}")))?;
            let v = HeaderValue::from_str(value)
                .map_err(|e| SyncError::InvalidConfig(format!("header '{name}' value: {e}")))?;
            raw_headers.insert(n, v);
        }

        Ok(Self {
            client,
            raw_headers,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_bytes(&self, locator: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get(locator)
            .headers(self.raw_headers.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SyncError::network(locator, e))?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| SyncError::network(locator, e))?;
        Ok(bytes.to_vec())
    }

    async fn list_directory(&self, locator: &str) -> Result<Vec<RemoteEntry>> {
        let value: serde_json::Value = self
            .client
            .get(locator)
            .header(ACCEPT, GITHUB_API_ACCEPT)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SyncError::network(locator, e))?
            .json()
            .await
            .map_err(|e| SyncError::network(locator, e))?;

        if !value.is_array() {
            return Err(SyncError::UnexpectedListing(locator.to_string()));
        }
        let items: Vec<ContentsItem> = serde_json::from_value(value)?;
        Ok(items
            .into_iter()
            .map(|item| RemoteEntry {
                is_file: item.item_type == "file",
                name: item.name,
                size: item.size,
                content_id: item.sha,
            })
            .collect())
    }
}
