//! Encryption at rest for secret records.
//!
//! Two independent schemes, each under its own 256-bit key:
//!
//! - [`FieldCipher`] seals small text fields (passwords, CVCs, notes, metadata)
//!   into self-describing tokens that embed their issue time:
//!
//!   ```text
//!   base64url-no-pad( 0x81 | issued_at:u64be | nonce:12 | ciphertext+tag )
//!   ```
//!
//!   The 9-byte header is bound as associated data, so the timestamp cannot be
//!   altered without failing verification.
//!
//! - [`BlobCipher`] seals bulk file content as raw `nonce | ciphertext | tag`
//!   bytes destined for the blob store.
//!
//! Both use AES-256-GCM-SIV with a fresh OS-random nonce per call.

pub mod blob;
pub mod field;
pub mod keys;

pub use blob::BlobCipher;
pub use field::FieldCipher;
pub use keys::{SymmetricKey, KEY_LEN};

use thiserror::Error;

/// Byte length of an AES-GCM-SIV nonce (12 bytes = 96 bits).
pub const NONCE_LEN: usize = 12;

/// Byte length of the AES-GCM-SIV authentication tag.
pub const TAG_LEN: usize = 16;

/// Errors produced by the cipher layer.
///
/// Only ever logged server-side; callers see a generic internal error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    /// Forged, corrupted, truncated or otherwise unverifiable ciphertext.
    #[error("ciphertext failed verification")]
    Invalid,

    /// The field token is older than the configured maximum age.
    #[error("field token expired")]
    Expired,

    /// AEAD sealing failed (unreachable with a valid key).
    #[error("aead encryption failed")]
    EncryptFailure,
}

/// Fresh random key for unit tests.
#[cfg(test)]
pub(crate) fn test_key() -> SymmetricKey {
    use aes_gcm_siv::aead::{rand_core::RngCore, OsRng};

    let mut bytes = [0u8; KEY_LEN];
    OsRng.fill_bytes(&mut bytes);
    match SymmetricKey::from_bytes(&bytes) {
        Ok(key) => key,
        Err(e) => panic!("random key rejected: {e}"),
    }
}
