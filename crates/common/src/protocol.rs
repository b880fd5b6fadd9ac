//! Request and response types exchanged between the vault and its clients.
//!
//! Every operation is a JSON body posted to its own route. Binary file content
//! travels as standard base64 inside the JSON document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Request body for `POST /v1/auth/register` and `POST /v1/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

/// Successful response body for `POST /v1/auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: String,
}

/// Successful response body for `POST /v1/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Signed bearer token to send in the `authorization` header.
    pub token: String,
}

// ---------------------------------------------------------------------------
// Shared secret-store envelopes
// ---------------------------------------------------------------------------

/// Request body for every `get` and `remove` route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretIdRequest {
    pub id: String,
}

/// Request body for every `search` route.
///
/// Matching is a case-insensitive substring test against the display fields
/// of the secret kind; an empty substring matches everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub substring: String,
    #[serde(default)]
    pub offset: u64,
    pub limit: u32,
}

/// Response body for every `search` route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse<T> {
    /// Total number of matches, independent of `offset`/`limit`.
    pub count: u64,
    pub items: Vec<T>,
}

/// Confirmation returned by every `add` and `remove` route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationResponse {
    pub id: String,
    pub msg: String,
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Request body for `POST /v1/accounts/add`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountAddRequest {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub server: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub meta: String,
}

/// Decrypted account returned by `POST /v1/accounts/get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSecret {
    pub login: String,
    pub server: String,
    pub password: String,
    pub meta: String,
}

/// Display-only account row returned by `POST /v1/accounts/search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountItem {
    pub id: String,
    pub login: String,
    pub server: String,
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

/// Request body for `POST /v1/cards/add`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardAddRequest {
    #[serde(default)]
    pub name: String,
    pub number: String,
    pub month: i32,
    pub year: i32,
    pub cvc: String,
    pub pin: String,
}

/// Decrypted card returned by `POST /v1/cards/get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSecret {
    pub name: String,
    pub number: String,
    pub month: i32,
    pub year: i32,
    pub cvc: String,
    pub pin: String,
}

/// Display-only card row returned by `POST /v1/cards/search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardItem {
    pub id: String,
    pub name: String,
    /// Card number with all but the last four digits replaced by `*`.
    pub mask: String,
}

// ---------------------------------------------------------------------------
// Notes
// ---------------------------------------------------------------------------

/// Request body for `POST /v1/notes/add`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteAddRequest {
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub meta: String,
}

/// Decrypted note returned by `POST /v1/notes/get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSecret {
    pub name: String,
    pub content: String,
    pub meta: String,
}

/// Display-only note row returned by `POST /v1/notes/search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteItem {
    pub id: String,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// Request body for `POST /v1/files/add`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileAddRequest {
    pub name: String,
    #[serde(with = "base64_bytes")]
    pub content: Vec<u8>,
    #[serde(default)]
    pub meta: String,
}

/// Decrypted file returned by `POST /v1/files/get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSecret {
    pub name: String,
    #[serde(with = "base64_bytes")]
    pub content: Vec<u8>,
    pub meta: String,
}

/// Display-only file row returned by `POST /v1/files/search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileItem {
    pub id: String,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Sync
// ---------------------------------------------------------------------------

/// Response body for `POST /v1/sync/get`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResponse {
    /// Time of the most recent add/remove performed by the caller.
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"invalid_argument"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}
