//! [`SymmetricKey`]: fixed-size key material loaded once at startup.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Errors raised while decoding configured key material.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The configured value is not valid standard base64.
    #[error("key is not valid base64")]
    Encoding,

    /// The decoded key material has an unexpected length.
    #[error("key has invalid length: expected {KEY_LEN} bytes, got {0}")]
    InvalidLength(usize),
}

/// Fixed-size key buffer that holds exactly [`KEY_LEN`] bytes.
///
/// Overwritten with zeroes on drop. Never printed, not even in debug builds.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_LEN]);

impl SymmetricKey {
    /// Build a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidLength`] if the slice is not [`KEY_LEN`] bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != KEY_LEN {
            return Err(KeyError::InvalidLength(bytes.len()));
        }
        let mut buf = [0u8; KEY_LEN];
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }

    /// Decode a base64 configuration value into a key.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Encoding`] on malformed base64 and
    /// [`KeyError::InvalidLength`] if the decoded length is wrong.
    pub fn from_base64(encoded: &str) -> Result<Self, KeyError> {
        let mut raw = STANDARD
            .decode(encoded.trim())
            .map_err(|_| KeyError::Encoding)?;
        let key = Self::from_bytes(&raw);
        raw.zeroize();
        key
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_base64_key() {
        let encoded = STANDARD.encode([0x42u8; KEY_LEN]);
        let key = SymmetricKey::from_base64(&encoded).unwrap();
        assert_eq!(key.as_bytes(), &[0x42u8; KEY_LEN]);
    }

    #[test]
    fn rejects_wrong_length() {
        let encoded = STANDARD.encode([0u8; 16]);
        assert!(matches!(
            SymmetricKey::from_base64(&encoded),
            Err(KeyError::InvalidLength(16))
        ));
    }

    #[test]
    fn rejects_bad_base64() {
        assert!(matches!(
            SymmetricKey::from_base64("!!!not-base64!!!"),
            Err(KeyError::Encoding)
        ));
    }

    #[test]
    fn key_redacted_in_debug() {
        let key = SymmetricKey::from_bytes(&[0xFF; KEY_LEN]).unwrap();
        let printed = format!("{key:?}");
        assert!(printed.contains("REDACTED"));
        assert!(!printed.contains("255"));
    }
}
