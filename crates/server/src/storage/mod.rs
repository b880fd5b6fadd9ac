//! Persistence collaborators consumed by the secret services.
//!
//! Each secret kind talks to its own narrow trait so services can be tested
//! against mocks and deployed against any backend. Two implementations ship:
//! [`postgres::PgStorage`] (sqlx, bounded pool, embedded migrations) and
//! [`memory::MemoryStorage`] for local runs and tests.
//!
//! # Invariants
//!
//! - Every read and delete is scoped by `(owner_id, id)`. A row owned by
//!   someone else is reported exactly like a missing row.
//! - Sensitive columns arrive here already sealed by the field cipher; this
//!   layer never sees plaintext secrets.
//! - Search matches display columns only, case-insensitively, in a stable
//!   order, and reports the total independently of the page.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::protocol::{AccountItem, CardItem, FileItem, NoteItem};
use thiserror::Error;
use uuid::Uuid;

#[cfg(test)]
use mockall::automock;

/// Errors produced by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No row matches the owner-scoped lookup.
    #[error("record not found")]
    NotFound,

    /// A uniqueness constraint was violated (duplicate login or file name).
    #[error("record already exists")]
    AlreadyExists,

    /// Any other backend failure.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// A registered principal as stored by the auth backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Uuid,
    pub login: String,
    /// PHC-formatted argon2 hash.
    pub password_hash: String,
}

/// Account row: `login`/`server` in plaintext, `password`/`meta` sealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedAccount {
    pub login: String,
    pub server: String,
    pub password: String,
    pub meta: String,
}

/// Card row: `name`/`mask` in plaintext, `number`/`cvc`/`pin` sealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedCard {
    pub name: String,
    pub mask: String,
    pub number: String,
    pub month: i32,
    pub year: i32,
    pub cvc: String,
    pub pin: String,
}

/// Note row: `name` in plaintext, `content`/`meta` sealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedNote {
    pub name: String,
    pub content: String,
    pub meta: String,
}

/// File metadata row. Content lives in the blob store under `owner_id/name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedFile {
    pub name: String,
    pub meta: String,
}

/// Validated search parameters. `limit` is always non-zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub substring: String,
    pub offset: u64,
    pub limit: u32,
}

/// One page of search results plus the unpaginated match count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPage<T> {
    pub items: Vec<T>,
    pub total: u64,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait AuthStore: Send + Sync {
    /// Persist a new user, returning its generated id.
    async fn save_user(&self, login: &str, password_hash: &str) -> Result<Uuid, StorageError>;
    /// Look up a user by login.
    async fn user(&self, login: &str) -> Result<UserRecord, StorageError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn add(&self, owner: Uuid, account: SealedAccount) -> Result<Uuid, StorageError>;
    async fn get(&self, owner: Uuid, id: Uuid) -> Result<SealedAccount, StorageError>;
    async fn search(
        &self,
        owner: Uuid,
        query: &SearchQuery,
    ) -> Result<SearchPage<AccountItem>, StorageError>;
    async fn remove(&self, owner: Uuid, id: Uuid) -> Result<(), StorageError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait CardStore: Send + Sync {
    async fn add(&self, owner: Uuid, card: SealedCard) -> Result<Uuid, StorageError>;
    async fn get(&self, owner: Uuid, id: Uuid) -> Result<SealedCard, StorageError>;
    async fn search(
        &self,
        owner: Uuid,
        query: &SearchQuery,
    ) -> Result<SearchPage<CardItem>, StorageError>;
    async fn remove(&self, owner: Uuid, id: Uuid) -> Result<(), StorageError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn add(&self, owner: Uuid, note: SealedNote) -> Result<Uuid, StorageError>;
    async fn get(&self, owner: Uuid, id: Uuid) -> Result<SealedNote, StorageError>;
    async fn search(
        &self,
        owner: Uuid,
        query: &SearchQuery,
    ) -> Result<SearchPage<NoteItem>, StorageError>;
    async fn remove(&self, owner: Uuid, id: Uuid) -> Result<(), StorageError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn add(&self, owner: Uuid, file: SealedFile) -> Result<Uuid, StorageError>;
    async fn get(&self, owner: Uuid, id: Uuid) -> Result<SealedFile, StorageError>;
    /// Whether the owner already has a file with this name.
    async fn name_exists(&self, owner: Uuid, name: &str) -> Result<bool, StorageError>;
    async fn search(
        &self,
        owner: Uuid,
        query: &SearchQuery,
    ) -> Result<SearchPage<FileItem>, StorageError>;
    async fn remove(&self, owner: Uuid, id: Uuid) -> Result<(), StorageError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait SyncStore: Send + Sync {
    /// Last recorded mutation time for `owner`.
    async fn get(&self, owner: Uuid) -> Result<DateTime<Utc>, StorageError>;
    /// Upsert "now" for `owner`. Never moves the marker backwards.
    async fn set(&self, owner: Uuid) -> Result<(), StorageError>;
}
