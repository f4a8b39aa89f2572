//! Common utility functions shared across the codebase.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of raw content bytes.
///
/// Content hashes key the CSS parse cache and the dependency tracker's
/// change detection.
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}
