//! Per-file staleness detection.
//!
//! Strategy scripts that opt into version checking are compared by their
//! embedded version marker; everything else is compared by content hash.
//! Detection is fail-closed: a verdict only says "update" when both the
//! local and the remote signature were obtained.

use futures::stream::{self, StreamExt};

use crate::hash::content_hash;
use crate::io::read_if_exists;
use crate::transport::Transport;
use crate::types::{DetectionStrategy, TrackedFile, Verdict};
use crate::version::{compare_versions, extract_version, VersionOrdering};

/// Compare one tracked file against its remote counterpart.
pub async fn detect(file: &TrackedFile, transport: &dyn Transport) -> Verdict {
    let strategy = file.strategy();
    let (local_signature, remote_signature) = match strategy {
        DetectionStrategy::Version => version_signatures(file, transport).await,
        DetectionStrategy::Hash => hash_signatures(file, transport).await,
    };

    let needs_update = match (&local_signature, &remote_signature) {
        (Some(local), Some(remote)) => match strategy {
            DetectionStrategy::Version => {
                compare_versions(local, remote) == VersionOrdering::RemoteNewer
            }
            DetectionStrategy::Hash => local != remote,
        },
        _ => {
            tracing::warn!(
                file = %file.name,
                local = local_signature.is_some(),
                remote = remote_signature.is_some(),
                "missing comparison basis; not updating"
            );
            false
        }
    };

    tracing::debug!(
        file = %file.name,
        ?strategy,
        local = local_signature.as_deref().unwrap_or("-"),
        remote = remote_signature.as_deref().unwrap_or("-"),
        needs_update,
        "compared"
    );

    Verdict {
        file: file.clone(),
        strategy,
        needs_update,
        local_signature,
        remote_signature,
    }
}

/// Detect every file with at most `concurrency` comparisons in flight.
/// Verdicts come back in catalog order.
pub async fn detect_all(
    files: &[TrackedFile],
    transport: &dyn Transport,
    concurrency: usize,
) -> Vec<Verdict> {
    let pending: Vec<_> = files.iter().map(|file| detect(file, transport)).collect();
    stream::iter(pending)
        .buffered(concurrency.max(1))
        .collect()
        .await
}

async fn local_bytes(file: &TrackedFile) -> Option<Vec<u8>> {
    match read_if_exists(&file.local_path).await {
        Ok(Some(bytes)) => Some(bytes),
        Ok(None) => {
            tracing::info!(file = %file.name, path = %file.local_path.display(), "no local copy");
            None
        }
        Err(e) => {
            tracing::warn!(file = %file.name, error = %e, "could not read local copy");
            None
        }
    }
}

async fn version_signatures(
    file: &TrackedFile,
    transport: &dyn Transport,
) -> (Option<String>, Option<String>) {
    let local = local_bytes(file)
        .await
        .and_then(|b| extract_version(&String::from_utf8_lossy(&b)));
    if local.is_none() {
        tracing::debug!(file = %file.name, "no local version marker");
    }

    let remote = match transport.fetch_text(&file.remote_locator).await {
        Ok(text) => {
            let v = extract_version(&text);
            if v.is_none() {
                tracing::warn!(file = %file.name, "remote copy has no version marker");
            }
            v
        }
        Err(e) => {
            tracing::warn!(file = %file.name, error = %e, "remote version fetch failed");
            None
        }
    };
    (local, remote)
}

async fn hash_signatures(
    file: &TrackedFile,
    transport: &dyn Transport,
) -> (Option<String>, Option<String>) {
    let local = local_bytes(file).await.map(|b| content_hash(&b));
    let remote = match transport.fetch_bytes(&file.remote_locator).await {
        Ok(bytes) => Some(content_hash(&bytes)),
        Err(e) => {
            tracing::warn!(file = %file.name, error = %e, "remote fetch failed");
            None
        }
    };
    (local, remote)
}
