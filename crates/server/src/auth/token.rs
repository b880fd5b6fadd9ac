//! Signed, time-bounded identity tokens (compact JWS, HS256).
//!
//! ```text
//! base64url(header) . base64url(claims) . base64url(hmac_sha256(header.claims))
//! ```
//!
//! The signature is verified in constant time before the claims are parsed or
//! the expiry is looked at.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";

/// Errors produced by [`TokenService::verify`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Malformed structure, unsupported algorithm, or signature mismatch.
    #[error("token is invalid")]
    Invalid,

    /// Signature verified but `exp` has passed.
    #[error("token has expired")]
    Expired,

    /// The signing key is empty or otherwise unusable.
    #[error("token signing key is invalid")]
    InvalidKey,
}

/// Identity claims carried inside a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Owner id of the authenticated principal.
    pub sub: String,
    pub role: String,
    /// Issued-at, unix seconds.
    pub iat: u64,
    /// Expires-at, unix seconds.
    pub exp: u64,
}

#[derive(Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Issues and verifies tokens under one shared signing secret and TTL.
#[derive(Clone)]
pub struct TokenService {
    mac: HmacSha256,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenService {
    /// Create a token service.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidKey`] if `secret` is empty. This is a
    /// startup-time failure; per-call signing cannot fail afterwards.
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Result<Self, TokenError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(TokenError::InvalidKey);
        }
        let mac = <HmacSha256 as Mac>::new_from_slice(secret).map_err(|_| TokenError::InvalidKey)?;
        Ok(Self { mac, ttl })
    }

    /// Issue a token for `subject` with `role`, valid for the configured TTL.
    pub fn generate(&self, subject: &str, role: &str) -> String {
        self.generate_at(subject, role, unix_now())
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Invalid`] for any structural or signature
    /// problem and [`TokenError::Expired`] once `exp` has passed.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, unix_now())
    }

    fn generate_at(&self, subject: &str, role: &str, now: u64) -> String {
        let header = Header {
            alg: ALGORITHM.into(),
            typ: "JWT".into(),
        };
        let claims = Claims {
            sub: subject.to_owned(),
            role: role.to_owned(),
            iat: now,
            exp: now.saturating_add(self.ttl.as_secs()),
        };
        // Serialising plain structs of strings and integers cannot fail.
        let header = serde_json::to_vec(&header).unwrap_or_default();
        let claims = serde_json::to_vec(&claims).unwrap_or_default();

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(claims)
        );
        let signature = self.mac().chain_update(signing_input.as_bytes()).finalize();
        format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature.into_bytes())
        )
    }

    fn verify_at(&self, token: &str, now: u64) -> Result<Claims, TokenError> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Invalid);
        };

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| TokenError::Invalid)?;
        let signing_input_len = header_b64.len() + 1 + claims_b64.len();
        self.mac()
            .chain_update(&token.as_bytes()[..signing_input_len])
            .verify_slice(&signature)
            .map_err(|_| TokenError::Invalid)?;

        let header: Header = URL_SAFE_NO_PAD
            .decode(header_b64)
            .ok()
            .and_then(|raw| serde_json::from_slice(&raw).ok())
            .ok_or(TokenError::Invalid)?;
        if header.alg != ALGORITHM {
            return Err(TokenError::Invalid);
        }

        let claims: Claims = URL_SAFE_NO_PAD
            .decode(claims_b64)
            .ok()
            .and_then(|raw| serde_json::from_slice(&raw).ok())
            .ok_or(TokenError::Invalid)?;

        if now > claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    fn mac(&self) -> HmacSha256 {
        self.mac.clone()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
