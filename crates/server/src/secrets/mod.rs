//! The four secret services.
//!
//! Each kind runs the same pipeline: validate the input, seal every
//! sensitive field with the field cipher (file content with the blob cipher),
//! persist through the kind's store, then bump the owner's sync marker.
//! Reads reverse it. Display fields stay in plaintext so search never has to
//! decrypt anything.

pub mod accounts;
pub mod cards;
pub mod files;
pub mod notes;

pub use accounts::AccountService;
pub use cards::CardService;
pub use files::FileService;
pub use notes::NoteService;

use common::protocol::{SearchRequest, SearchResponse};
use thiserror::Error;
use uuid::Uuid;

use crate::blob::BlobStoreError;
use crate::crypto::CipherError;
use crate::storage::{SearchPage, SearchQuery, StorageError};

#[derive(Debug, Error)]
pub enum SecretError {
    /// Malformed or missing input; the message is safe to return.
    #[error("{0}")]
    Validation(String),

    /// No record for this `(owner, id)`. Also covers other owners' records.
    #[error("secret not found")]
    NotFound,

    /// Stored ciphertext failed to open, or sealing failed.
    #[error("cipher failure: {0}")]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Storage(StorageError),

    #[error(transparent)]
    BlobStore(#[from] BlobStoreError),
}

impl From<StorageError> for SecretError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => SecretError::NotFound,
            other => SecretError::Storage(other),
        }
    }
}

impl SecretError {
    fn validation(msg: impl Into<String>) -> Self {
        SecretError::Validation(msg.into())
    }
}

/// Parse a record id. A value that is not a UUID cannot name any record.
pub fn parse_id(id: &str) -> Result<Uuid, SecretError> {
    if id.is_empty() {
        return Err(SecretError::validation("id is required"));
    }
    Uuid::parse_str(id).map_err(|_| SecretError::NotFound)
}

/// Turn a search request into a storage query, rejecting `limit == 0`.
pub fn search_query(req: SearchRequest) -> Result<SearchQuery, SecretError> {
    if req.limit == 0 {
        return Err(SecretError::validation("limit can't be 0"));
    }
    Ok(SearchQuery {
        substring: req.substring,
        offset: req.offset,
        limit: req.limit,
    })
}

impl<T> From<SearchPage<T>> for SearchResponse<T> {
    fn from(page: SearchPage<T>) -> Self {
        SearchResponse {
            count: page.total,
            items: page.items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_id_is_validation_error() {
        assert!(matches!(parse_id(""), Err(SecretError::Validation(m)) if m == "id is required"));
    }

    #[test]
    fn malformed_id_is_not_found() {
        assert!(matches!(parse_id("not-a-uuid"), Err(SecretError::NotFound)));
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn zero_limit_rejected() {
        let req = SearchRequest {
            substring: "x".into(),
            offset: 0,
            limit: 0,
        };
        assert!(matches!(search_query(req), Err(SecretError::Validation(_))));
    }

    #[test]
    fn storage_not_found_becomes_secret_not_found() {
        assert!(matches!(
            SecretError::from(StorageError::NotFound),
            SecretError::NotFound
        ));
        assert!(matches!(
            SecretError::from(StorageError::Backend("down".into())),
            SecretError::Storage(_)
        ));
    }
}
