//! Version marker extraction and dotted-numeric version ordering.
//!
//! The tracked strategy script reports its own version through an accessor
//! of the form:
//!
//! ```text
//! def version(self) -> str:
//!     return "v16.5.255"
//! ```
//!
//! [`extract_version`] pulls the quoted literal out of that accessor and
//! [`compare_versions`] orders two such literals.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::OnceLock;

static VERSION_RE: OnceLock<Regex> = OnceLock::new();

fn version_re() -> &'static Regex {
    VERSION_RE.get_or_init(|| {
        Regex::new(r#"def\s+version\s*\(\s*self\s*\)\s*->\s*str\s*:[ \t]*\r?\n\s*return\s*["']([^"'\r\n]+)["']"#)
            .expect("version marker regex is valid")
    })
}

/// Return the version literal embedded in `content`, if the marker is present.
pub fn extract_version(content: &str) -> Option<String> {
    version_re()
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// How the remote version relates to the local one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionOrdering {
    RemoteNewer,
    RemoteOlder,
    Equal,
}

impl VersionOrdering {
    pub fn reverse(self) -> Self {
        match self {
            VersionOrdering::RemoteNewer => VersionOrdering::RemoteOlder,
            VersionOrdering::RemoteOlder => VersionOrdering::RemoteNewer,
            VersionOrdering::Equal => VersionOrdering::Equal,
        }
    }
}

/// Parse `v16.5.255` / `16.5.255` into numeric components.
///
/// Returns `None` when any component is not a non-negative integer.
pub fn parse_components(version: &str) -> Option<Vec<u64>> {
    let trimmed = version.trim();
    let body = match trimmed.chars().next() {
        Some(c) if !c.is_ascii_digit() => &trimmed[c.len_utf8()..],
        _ => trimmed,
    };
    if body.is_empty() {
        return None;
    }
    body.split('.')
        .map(|part| part.trim().parse::<u64>().ok())
        .collect()
}

/// Compare a local version against a remote one.
///
/// Missing trailing components count as zero, so `1.2` equals `1.2.0`. The
/// first differing component decides. Malformed input on either side
/// compares as [`VersionOrdering::Equal`] so that no update is forced
/// without a trustworthy comparison.
pub fn compare_versions(local: &str, remote: &str) -> VersionOrdering {
    let (Some(local_parts), Some(remote_parts)) =
        (parse_components(local), parse_components(remote))
    else {
        tracing::warn!(
            local = %local,
            remote = %remote,
            "malformed version component; treating versions as equal"
        );
        return VersionOrdering::Equal;
    };

    let len = local_parts.len().max(remote_parts.len());
    for i in 0..len {
        let l = local_parts.get(i).copied().unwrap_or(0);
        let r = remote_parts.get(i).copied().unwrap_or(0);
        match r.cmp(&l) {
            Ordering::Greater => return VersionOrdering::RemoteNewer,
            Ordering::Less => return VersionOrdering::RemoteOlder,
            Ordering::Equal => {}
        }
    }
    VersionOrdering::Equal
}

/// Index of the first component where `remote` is ahead of `local`.
///
/// `0` is a major bump, `1` minor, anything later a patch. Used by
/// notification formatting.
pub fn first_bumped_component(local: &str, remote: &str) -> Option<usize> {
    let local_parts = parse_components(local)?;
    let remote_parts = parse_components(remote)?;
    let len = local_parts.len().max(remote_parts.len());
    (0..len).find_map(|i| {
        let l = local_parts.get(i).copied().unwrap_or(0);
        let r = remote_parts.get(i).copied().unwrap_or(0);
        match r.cmp(&l) {
            Ordering::Greater => Some(Some(i)),
            Ordering::Less => Some(None),
            Ordering::Equal => None,
        }
    })?
}
