//! Object storage for encrypted file content.
//!
//! Objects are addressed as `"{owner_id}/{name}"`; the bytes handed to a
//! [`BlobStore`] are always blob-cipher output, never plaintext.

pub mod memory;
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use uuid::Uuid;

#[cfg(test)]
use mockall::automock;

pub use memory::MemoryBlobStore;
pub use s3::S3BlobStore;

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("object not found")]
    NotFound,

    #[error("blob store failure: {0}")]
    Backend(String),
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key`, replacing any previous object.
    async fn put_object(&self, key: &str, bytes: Bytes) -> Result<(), BlobStoreError>;
    /// Fetch the object stored under `key`.
    async fn get_object(&self, key: &str) -> Result<Bytes, BlobStoreError>;
    /// Delete the object under `key`. Deleting a missing object succeeds.
    async fn remove_object(&self, key: &str) -> Result<(), BlobStoreError>;
}

/// Object key for the file `name` owned by `owner`.
pub fn object_key(owner: Uuid, name: &str) -> String {
    format!("{owner}/{name}")
}
