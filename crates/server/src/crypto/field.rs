//! Time-stamped, authenticated encryption of individual string fields.
//!
//! Each sensitive column (account password, card CVC, note content, ...) is
//! sealed independently, so a tampered or corrupted row fails on the exact
//! field that was touched rather than on the whole record.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use aes_gcm_siv::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng, Payload},
    Aes256GcmSiv, Key, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

use super::{CipherError, SymmetricKey, NONCE_LEN, TAG_LEN};

/// Leading byte of every field token.
pub const VERSION: u8 = 0x81;

/// Version byte plus big-endian issue timestamp.
const HEADER_LEN: usize = 1 + 8;

/// Tokens stamped further than this into the future are rejected.
const MAX_CLOCK_SKEW_SECS: u64 = 60;

/// Seals and opens field tokens under a single shared key.
#[derive(Clone, Debug)]
pub struct FieldCipher {
    key: SymmetricKey,
    max_age: Option<Duration>,
}

impl FieldCipher {
    /// Create a cipher whose tokens never expire.
    pub fn new(key: SymmetricKey) -> Self {
        Self { key, max_age: None }
    }

    /// Reject tokens older than `max_age` on decryption.
    pub fn with_max_age(mut self, max_age: Option<Duration>) -> Self {
        self.max_age = max_age;
        self
    }

    /// Encrypt `plaintext` into a token stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::EncryptFailure`] on an internal AEAD error.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, CipherError> {
        self.encrypt_at(plaintext, unix_now())
    }

    /// Verify and decrypt a token produced by [`FieldCipher::encrypt`], applying
    /// the configured maximum age.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Invalid`] if the token is malformed or fails
    /// authentication, and [`CipherError::Expired`] if it is too old.
    pub fn decrypt(&self, token: &str) -> Result<Vec<u8>, CipherError> {
        self.decrypt_at(token, self.max_age, unix_now())
    }

    /// Encrypt a UTF-8 field.
    pub fn encrypt_str(&self, plaintext: &str) -> Result<String, CipherError> {
        self.encrypt(plaintext.as_bytes())
    }

    /// Decrypt a token that is expected to hold a UTF-8 field.
    pub fn decrypt_str(&self, token: &str) -> Result<String, CipherError> {
        String::from_utf8(self.decrypt(token)?).map_err(|_| CipherError::Invalid)
    }

    fn encrypt_at(&self, plaintext: &[u8], issued_at: u64) -> Result<String, CipherError> {
        let cipher = build_cipher(&self.key);

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);

        let mut header = [0u8; HEADER_LEN];
        header[0] = VERSION;
        header[1..].copy_from_slice(&issued_at.to_be_bytes());

        let sealed = cipher
            .encrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: plaintext,
                    aad: &header,
                },
            )
            .map_err(|_| CipherError::EncryptFailure)?;

        let mut raw = Vec::with_capacity(HEADER_LEN + NONCE_LEN + sealed.len());
        raw.extend_from_slice(&header);
        raw.extend_from_slice(&nonce_bytes);
        raw.extend_from_slice(&sealed);
        Ok(URL_SAFE_NO_PAD.encode(raw))
    }

    fn decrypt_at(
        &self,
        token: &str,
        max_age: Option<Duration>,
        now: u64,
    ) -> Result<Vec<u8>, CipherError> {
        let raw = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| CipherError::Invalid)?;
        if raw.len() < HEADER_LEN + NONCE_LEN + TAG_LEN || raw[0] != VERSION {
            return Err(CipherError::Invalid);
        }

        let (header, rest) = raw.split_at(HEADER_LEN);
        let (nonce, sealed) = rest.split_at(NONCE_LEN);

        let plaintext = build_cipher(&self.key)
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: sealed,
                    aad: header,
                },
            )
            .map_err(|_| CipherError::Invalid)?;

        // The timestamp is only trusted once the tag has verified.
        let mut ts = [0u8; 8];
        ts.copy_from_slice(&header[1..]);
        let issued_at = u64::from_be_bytes(ts);

        if issued_at > now.saturating_add(MAX_CLOCK_SKEW_SECS) {
            return Err(CipherError::Invalid);
        }
        if let Some(max_age) = max_age {
            if now.saturating_sub(issued_at) > max_age.as_secs() {
                return Err(CipherError::Expired);
            }
        }
        Ok(plaintext)
    }
}

fn build_cipher(key: &SymmetricKey) -> Aes256GcmSiv {
    Aes256GcmSiv::new(Key::<Aes256GcmSiv>::from_slice(key.as_bytes()))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
