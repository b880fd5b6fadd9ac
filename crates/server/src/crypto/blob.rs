//! AEAD sealing of bulk binary payloads (file content).
//!
//! Output layout is `nonce | ciphertext | tag`. Unlike field tokens, blobs carry
//! no timestamp and no text encoding; they are written as-is to the blob store.

use aes_gcm_siv::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng},
    Aes256GcmSiv, Key, Nonce,
};

use super::{CipherError, SymmetricKey, NONCE_LEN};

/// Seals and opens file blobs under a single shared key.
#[derive(Clone, Debug)]
pub struct BlobCipher {
    key: SymmetricKey,
}

impl BlobCipher {
    pub fn new(key: SymmetricKey) -> Self {
        Self { key }
    }

    /// Encrypt `plaintext` under a fresh random nonce.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::EncryptFailure`] on an internal AEAD error.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);

        let sealed = self
            .cipher()
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|_| CipherError::EncryptFailure)?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    /// Verify and decrypt a blob produced by [`BlobCipher::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Invalid`] if the input is shorter than a nonce or
    /// the authentication tag does not verify.
    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>, CipherError> {
        if blob.len() < NONCE_LEN {
            return Err(CipherError::Invalid);
        }
        let (nonce, sealed) = blob.split_at(NONCE_LEN);
        self.cipher()
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| CipherError::Invalid)
    }

    fn cipher(&self) -> Aes256GcmSiv {
        Aes256GcmSiv::new(Key::<Aes256GcmSiv>::from_slice(self.key.as_bytes()))
    }
}
