//! Binary files.
//!
//! Content is sealed with the blob cipher and written to the blob store under
//! `{owner_id}/{name}`; the metadata row holds only the name and the sealed
//! meta field.
//!
//! Blob and row are written by two independent calls. `add` puts the blob
//! first, so a failed insert can leave an orphaned object but never a row
//! pointing at nothing. `remove` deletes the blob first, so a failed row
//! delete leaves a row whose content is gone; `get_secret` then reports a
//! blob store error for it. Neither case is compensated automatically.

use std::sync::Arc;

use bytes::Bytes;
use common::protocol::{FileAddRequest, FileItem, FileSecret, SearchRequest, SearchResponse};
use tracing::{info, warn};
use uuid::Uuid;

use super::{parse_id, search_query, SecretError};
use crate::blob::{object_key, BlobStore, BlobStoreError};
use crate::crypto::{BlobCipher, FieldCipher};
use crate::storage::{FileStore, SealedFile, StorageError};
use crate::sync::SyncTracker;
use crate::validation::require;

const DUPLICATE_NAME: &str = "file with this name already exists";

#[derive(Clone)]
pub struct FileService {
    store: Arc<dyn FileStore>,
    blobs: Arc<dyn BlobStore>,
    fields: FieldCipher,
    contents: BlobCipher,
    sync: SyncTracker,
}

impl FileService {
    pub fn new(
        store: Arc<dyn FileStore>,
        blobs: Arc<dyn BlobStore>,
        fields: FieldCipher,
        contents: BlobCipher,
        sync: SyncTracker,
    ) -> Self {
        Self {
            store,
            blobs,
            fields,
            contents,
            sync,
        }
    }

    /// Seal `content` into the blob store under `{owner}/{name}`, then insert
    /// the metadata row.
    ///
    /// # Known race
    ///
    /// Two concurrent adds of the same name by the same owner both pass the
    /// duplicate check and both write the same object key. The row insert lets
    /// only one of them win, but the loser's blob write may land last, so the
    /// winning row can end up serving the losing request's content. The
    /// caller of the losing request still gets a duplicate-name error.
    ///
    /// # Errors
    ///
    /// [`SecretError::Validation`] for an empty or `/`-containing name, empty
    /// content, or a name already used by `owner`; [`SecretError::BlobStore`]
    /// when the blob write fails (no row is written); [`SecretError::Storage`]
    /// when the insert fails (the blob is left behind).
    pub async fn add(&self, owner: Uuid, req: FileAddRequest) -> Result<Uuid, SecretError> {
        require("name", &req.name).map_err(SecretError::Validation)?;
        if req.name.contains('/') {
            return Err(SecretError::validation("name must not contain '/'"));
        }
        if req.content.is_empty() {
            return Err(SecretError::validation("content is required"));
        }
        if self.store.name_exists(owner, &req.name).await? {
            return Err(SecretError::validation(DUPLICATE_NAME));
        }

        let meta = self.fields.encrypt_str(&req.meta)?;
        let sealed = self.contents.encrypt(&req.content)?;
        let key = object_key(owner, &req.name);
        self.blobs.put_object(&key, Bytes::from(sealed)).await?;

        let id = match self
            .store
            .add(
                owner,
                SealedFile {
                    name: req.name,
                    meta,
                },
            )
            .await
        {
            Ok(id) => id,
            // Lost the race described on this method.
            Err(StorageError::AlreadyExists) => {
                warn!(
                    owner_id = %owner,
                    key = %key,
                    "concurrent add of the same file name; stored content may have been replaced"
                );
                return Err(SecretError::validation(DUPLICATE_NAME));
            }
            Err(e) => {
                warn!(owner_id = %owner, key = %key, "file row insert failed; blob left in place");
                return Err(e.into());
            }
        };
        self.sync.notify(owner).await;

        info!(owner_id = %owner, id = %id, size = req.content.len(), "file added");
        Ok(id)
    }

    /// Fetch a file's metadata and unseal its content from the blob store.
    ///
    /// # Errors
    ///
    /// [`SecretError::NotFound`] for an unknown or foreign id;
    /// [`SecretError::BlobStore`] when the row exists but its content is gone;
    /// [`SecretError::Cipher`] when the content or meta fails verification.
    pub async fn get_secret(&self, owner: Uuid, id: &str) -> Result<FileSecret, SecretError> {
        let id = parse_id(id)?;
        let row = self.store.get(owner, id).await?;

        let key = object_key(owner, &row.name);
        let sealed = match self.blobs.get_object(&key).await {
            Ok(bytes) => bytes,
            Err(BlobStoreError::NotFound) => {
                return Err(SecretError::BlobStore(BlobStoreError::Backend(format!(
                    "content missing for file {id}"
                ))))
            }
            Err(e) => return Err(e.into()),
        };

        Ok(FileSecret {
            content: self.contents.decrypt(&sealed)?,
            meta: self.fields.decrypt_str(&row.meta)?,
            name: row.name,
        })
    }

    /// Search files by name. Never touches the blob store.
    ///
    /// # Errors
    ///
    /// [`SecretError::Validation`] for a zero limit.
    pub async fn search(
        &self,
        owner: Uuid,
        req: SearchRequest,
    ) -> Result<SearchResponse<FileItem>, SecretError> {
        let query = search_query(req)?;
        Ok(self.store.search(owner, &query).await?.into())
    }

    /// Delete the blob, then the metadata row.
    ///
    /// # Errors
    ///
    /// [`SecretError::NotFound`] for an unknown or foreign id;
    /// [`SecretError::BlobStore`] when the blob delete fails, in which case
    /// the row is kept.
    pub async fn remove(&self, owner: Uuid, id: &str) -> Result<Uuid, SecretError> {
        let id = parse_id(id)?;
        let row = self.store.get(owner, id).await?;

        self.blobs.remove_object(&object_key(owner, &row.name)).await?;
        self.store.remove(owner, id).await?;
        self.sync.notify(owner).await;

        info!(owner_id = %owner, id = %id, "file removed");
        Ok(id)
    }
}
