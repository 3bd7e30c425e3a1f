//! Resolution of the set of tracked files for one cycle.
//!
//! The catalog is the ordered union of the statically configured files and
//! whatever the configured remote folders currently contain. A folder whose
//! listing fails contributes nothing; the rest of the catalog is unaffected.

use std::path::{Component, Path};

use crate::config::{Config, DynamicFolder};
use crate::error::Result;
use crate::transport::Transport;
use crate::types::{FileKind, TrackedFile};

/// Build the full catalog: static entries first, then each folder's
/// matching files in configured order.
///
/// Only an invalid configuration fails the build.
pub async fn build_catalog(config: &Config, transport: &dyn Transport) -> Result<Vec<TrackedFile>> {
    config.ensure_valid()?;

    let mut files = static_entries(config);
    let static_count = files.len();

    for folder in &config.dynamic_folders {
        files.extend(folder_entries(config, folder, transport).await);
    }

    tracing::info!(
        total = files.len(),
        static_files = static_count,
        dynamic_files = files.len() - static_count,
        "catalog built"
    );
    Ok(files)
}

fn static_entries(config: &Config) -> Vec<TrackedFile> {
    config
        .static_files
        .iter()
        .map(|f| TrackedFile {
            name: f.name.clone(),
            local_path: f.local_path.clone(),
            remote_locator: config.source.file_locator(&f.remote_path),
            kind: f.kind,
            uses_version_check: f.version_check,
            allowed_extensions: None,
            size: None,
            content_id: None,
        })
        .collect()
}

/// Entries discovered in one remote folder. Listing failures yield nothing.
async fn folder_entries(
    config: &Config,
    folder: &DynamicFolder,
    transport: &dyn Transport,
) -> Vec<TrackedFile> {
    let locator = config.source.listing_locator(&folder.remote_path);
    let listing = match transport.list_directory(&locator).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(
                folder = %folder.name,
                error = %e,
                "folder listing failed; skipping folder this cycle"
            );
            return Vec::new();
        }
    };

    let found = listing.iter().filter(|e| e.is_file).count();
    let base = folder.remote_path.trim_matches('/');
    let kept: Vec<TrackedFile> = listing
        .into_iter()
        .filter(|e| e.is_file && folder.allows(&e.name))
        .filter(|e| {
            let plain = is_plain_file_name(&e.name);
            if !plain {
                tracing::warn!(
                    folder = %folder.name,
                    entry = %e.name,
                    "listing entry is not a plain file name; ignoring"
                );
            }
            plain
        })
        .map(|e| TrackedFile {
            local_path: folder.local_path.join(&e.name),
            remote_locator: config.source.file_locator(&format!("{base}/{}", e.name)),
            kind: FileKind::Config,
            uses_version_check: false,
            allowed_extensions: Some(folder.file_extensions.clone()),
            size: e.size,
            content_id: e.content_id,
            name: e.name,
        })
        .collect();

    tracing::info!(
        folder = %folder.name,
        found,
        kept = kept.len(),
        "folder listed"
    );
    kept
}

/// A listing name must stay inside the folder it was listed from.
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
