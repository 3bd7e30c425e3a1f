use freqsync_core::config::DEFAULT_CONFIG_FILE;
use std::path::{Path, PathBuf};

/// Resolve the config file to load.
///
/// Priority:
/// 1. `--config` flag / `FREQSYNC_CONFIG` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `freqsync.yaml`
/// 3. Fall back to `cwd/freqsync.yaml` (which then fails to load with a hint)
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = current_dir();
    find_upward(&cwd).unwrap_or_else(|| cwd.join(DEFAULT_CONFIG_FILE))
}

/// Where `init` writes. Never searches parent directories.
pub fn init_target(explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(p) => p.to_path_buf(),
        None => current_dir().join(DEFAULT_CONFIG_FILE),
    }
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn find_upward(start: &Path) -> Option<PathBuf> {
    let mut dir = start;
    loop {
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
}
