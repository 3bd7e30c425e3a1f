//! Content digests for files that carry no version marker.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of raw bytes.
///
/// Local and remote content both go through this function untouched, so
/// the digests only differ when the bytes do.
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Shortened digest for display.
pub fn short_hash(hash: &str) -> &str {
    let end = hash
        .char_indices()
        .nth(12)
        .map(|(i, _)| i)
        .unwrap_or(hash.len());
    &hash[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digest() {
        assert_eq!(
            content_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn single_byte_difference_changes_digest() {
        assert_ne!(content_hash(b"{\"a\": 1}"), content_hash(b"{\"a\": 2}"));
    }

    #[test]
    fn line_endings_are_not_normalized() {
        assert_ne!(content_hash(b"a\nb\n"), content_hash(b"a\r\nb\r\n"));
    }

    #[test]
    fn short_hash_truncates() {
        let h = content_hash(b"abc");
        assert_eq!(short_hash(&h), "ba7816bf8f01");
        assert_eq!(short_hash("abc"), "abc");
    }
}
