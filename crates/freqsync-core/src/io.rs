use crate::error::{Result, SyncError};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
///
/// Missing parent directories are created first. The destination is only
/// replaced by the final rename, so a failure at any earlier step leaves an
/// existing file untouched.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    ensure_dir(dir)?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| SyncError::filesystem(dir, e))?;
    tmp.write_all(data)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| SyncError::filesystem(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| SyncError::filesystem(path, e.error))?;
    Ok(())
}

/// Create a directory and all parents, idempotent.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| SyncError::filesystem(path, e))?;
    Ok(())
}

/// Read a file, returning `Ok(None)` when it does not exist.
pub async fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SyncError::filesystem(path, e)),
    }
}
