//! Content fingerprinting for change detection.

use sha2::{Digest, Sha256};

/// SHA-256 hex digest of `content`.
///
/// Deterministic and environment independent; used for equality testing
/// only.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
