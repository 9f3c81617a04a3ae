//! SHA-256 verification of downloaded archives.
//!
//! Digests come from the GitHub Releases API in the form `sha256:<hex>`;
//! a bare hex string is accepted as well.

use crate::error::{Result, UpdateError};

/// Normalises an expected digest to lowercase hex.
///
/// Returns [`UpdateError::NoDigestAvailable`] when it is not a SHA-256 digest.
pub fn parse_digest(digest: &str) -> Result<String> {
    let hex_digest = digest
        .trim()
        .strip_prefix("sha256:")
        .unwrap_or(digest.trim())
        .to_ascii_lowercase();

    if hex_digest.len() != 64 || !hex_digest.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(UpdateError::NoDigestAvailable);
    }
    Ok(hex_digest)
}

/// Compares a computed hash against the expected digest.
pub fn check_digest(actual_hex: &str, expected_digest: &str) -> Result<()> {
    let expected = parse_digest(expected_digest)?;
    if actual_hex != expected {
        return Err(UpdateError::ChecksumMismatch {
            expected,
            actual: actual_hex.to_string(),
        });
    }
    tracing::info!("SHA256 verification passed: {}", actual_hex);
    Ok(())
}
