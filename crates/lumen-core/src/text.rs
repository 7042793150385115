//! Question normalization and cache fingerprinting.

use sha2::{Digest, Sha256};

/// Normalizes a question: trims and collapses internal whitespace runs to a
/// single space. Idempotent.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Stable fingerprint of a question: SHA-256 over the lowercased normalized
/// text, hex-encoded. Two questions that differ only in case or spacing
/// share a fingerprint; any other difference, anywhere in the text,
/// produces a distinct one.
pub fn fingerprint(text: &str) -> String {
    let canonical = normalize(text).to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}
