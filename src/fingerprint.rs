//! Deterministic request-parameter fingerprint for audit traceability.
//!
//! Two logical requests with the same parameters always hash
//! identically: [`CallParams`] iterates in sorted key order and the
//! credential is never part of the set. The fingerprint is used purely
//! for audit trails, never for caching.

use crate::params::CallParams;

/// Hex blake3 digest of the sorted `key=value` parameter lines.
pub fn params_fingerprint(params: &CallParams) -> String {
    let mut hasher = blake3::Hasher::new();
    for (key, value) in params.iter() {
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().to_string()
}
