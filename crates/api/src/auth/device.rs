//! Shared-secret device keys.
//!
//! Keys are compared through their SHA-256 digests so the comparison does
//! not short-circuit on the first differing byte of the secret itself. Only
//! a short digest prefix ever reaches logs or the audit trail.

use sha2::{Digest, Sha256};

/// Hex characters of the digest kept as the device fingerprint.
const FINGERPRINT_LEN: usize = 8;

/// Whether `presented` equals the configured key.
pub fn verify_device_key(presented: &str, expected: &str) -> bool {
    Sha256::digest(presented.as_bytes()) == Sha256::digest(expected.as_bytes())
}

/// Stable, non-reversible identifier for a device key.
pub fn fingerprint(key: &str) -> String {
    let hex = format!("{:x}", Sha256::digest(key.as_bytes()));
    hex[..FINGERPRINT_LEN].to_string()
}
