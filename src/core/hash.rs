//! Canonical Hashing for Attestation
//!
//! Provides deterministic hashing of match facts for:
//! - Result attestation (the minimal fact committed on-chain)
//! - Full match-data attestation
//! - Spot verification of exported reports
//!
//! Every value is written with a fixed width or a length prefix, so two
//! encodings can only collide if the underlying field values are equal.

use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type Digest32 = [u8; 32];

/// Domain separator for result hashes.
pub const RESULT_DOMAIN: &[u8] = b"MATCH_INTEGRITY_RESULT_V1";

/// Domain separator for full match-data hashes.
pub const MATCH_DATA_DOMAIN: &[u8] = b"MATCH_INTEGRITY_MATCH_DATA_V1";

/// Deterministic hasher over a canonical binary encoding.
///
/// Wraps SHA-256 with typed update helpers.
/// Order of updates is critical for determinism.
pub struct CanonicalHasher {
    hasher: Sha256,
}

impl CanonicalHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for result attestation.
    pub fn for_result() -> Self {
        Self::new(RESULT_DOMAIN)
    }

    /// Create hasher for full match data.
    pub fn for_match_data() -> Self {
        Self::new(MATCH_DATA_DOMAIN)
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with an i32 value (little-endian).
    #[inline]
    pub fn update_i32(&mut self, value: i32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with an i64 value (little-endian).
    #[inline]
    pub fn update_i64(&mut self, value: i64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a UTF-8 string, prefixed with its byte length.
    pub fn update_str(&mut self, value: &str) {
        self.update_u32(value.len() as u32);
        self.hasher.update(value.as_bytes());
    }

    /// Update with an optional string (presence byte, then the value).
    pub fn update_opt_str(&mut self, value: Option<&str>) {
        match value {
            Some(s) => {
                self.update_u8(1);
                self.update_str(s);
            }
            None => self.update_u8(0),
        }
    }

    /// Update with an optional i32 (presence byte, then the value).
    pub fn update_opt_i32(&mut self, value: Option<i32>) {
        match value {
            Some(v) => {
                self.update_u8(1);
                self.update_i32(v);
            }
            None => self.update_u8(0),
        }
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> Digest32 {
        self.hasher.finalize().into()
    }
}

/// Render a digest as lowercase hex.
pub fn to_hex(digest: &Digest32) -> String {
    hex::encode(digest)
}

/// Parse a 64-character hex string back into a digest.
pub fn from_hex(s: &str) -> Option<Digest32> {
    let bytes = hex::decode(s.trim()).ok()?;
    bytes.try_into().ok()
}

// =============================================================================
// TESTS
// =============================================================================
