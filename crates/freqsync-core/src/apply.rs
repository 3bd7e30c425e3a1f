//! Installing new remote content over a local copy.

use crate::error::{Result, SyncError};
use crate::io::atomic_write;
use crate::transport::Transport;
use crate::types::{ApplyResult, TrackedFile};

/// Download `file` in full and atomically replace its local copy.
///
/// Never fails: network and filesystem errors are captured in the
/// returned [`ApplyResult`], and the previous local file is left as it was.
pub async fn apply(file: &TrackedFile, transport: &dyn Transport) -> ApplyResult {
    tracing::info!(file = %file.name, "downloading");
    match fetch_and_write(file, transport).await {
        Ok(written) => {
            tracing::info!(
                file = %file.name,
                path = %file.local_path.display(),
                bytes = written,
                "updated"
            );
            ApplyResult::success(file.clone(), written)
        }
        Err(e) => {
            tracing::error!(file = %file.name, error = %e, "update failed");
            ApplyResult::failure(file.clone(), e)
        }
    }
}

async fn fetch_and_write(file: &TrackedFile, transport: &dyn Transport) -> Result<u64> {
    let bytes = transport.fetch_bytes(&file.remote_locator).await?;
    let len = bytes.len() as u64;
    let path = file.local_path.clone();
    tokio::task::spawn_blocking(move || atomic_write(&path, &bytes))
        .await
        .map_err(|e| SyncError::Io(std::io::Error::other(e)))??;
    Ok(len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{tracked, FakeTransport};
    use crate::types::FileKind;
    use tempfile::TempDir;

    #[tokio::test]
    async fn written_bytes_match_fetched_bytes() {
        let dir = TempDir::new().unwrap();
        let file = tracked(&dir, "blacklist.json", FileKind::Config, false);
        let payload: Vec<u8> = (0u8..=255).chain(b"\r\n\xff".iter().copied()).collect();
        let transport = FakeTransport::new().with_file(&file.remote_locator, payload.clone());

        let result = apply(&file, &transport).await;
        assert!(result.succeeded, "{:?}", result.error);
        assert_eq!(result.bytes_written, Some(payload.len() as u64));
        assert_eq!(std::fs::read(&file.local_path).unwrap(), payload);
    }

    #[tokio::test]
    async fn creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let mut file = tracked(&dir, "pairlist.json", FileKind::Config, false);
        file.local_path = dir.path().join("configs/exchanges/pairlist.json");
        let transport = FakeTransport::new().with_file(&file.remote_locator, "{}");

        assert!(apply(&file, &transport).await.succeeded);
        assert!(file.local_path.exists());
    }

    #[tokio::test]
    async fn failed_fetch_leaves_existing_file() {
        let dir = TempDir::new().unwrap();
        let file = tracked(&dir, "S.py", FileKind::Strategy, true);
        std::fs::write(&file.local_path, b"original").unwrap();
        let transport = FakeTransport::new().with_fetch_error(&file.remote_locator);

        let result = apply(&file, &transport).await;
        assert!(!result.succeeded);
        assert!(result.error.unwrap().contains("network error"));
        assert_eq!(std::fs::read(&file.local_path).unwrap(), b"original");
    }

    #[tokio::test]
    async fn failed_write_is_captured() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("configs");
        std::fs::write(&blocker, b"i am a file").unwrap();
        let mut file = tracked(&dir, "x.json", FileKind::Config, false);
        file.local_path = blocker.join("x.json");
        let transport = FakeTransport::new().with_file(&file.remote_locator, "{}");

        let result = apply(&file, &transport).await;
        assert!(!result.succeeded);
        assert!(result.error.unwrap().contains("filesystem error"));
        assert_eq!(std::fs::read(&blocker).unwrap(), b"i am a file");
    }
}
