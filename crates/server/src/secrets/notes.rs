//! Free-text notes.

use std::sync::Arc;

use common::protocol::{NoteAddRequest, NoteItem, NoteSecret, SearchRequest, SearchResponse};
use tracing::info;
use uuid::Uuid;

use super::{parse_id, search_query, SecretError};
use crate::crypto::FieldCipher;
use crate::storage::{NoteStore, SealedNote};
use crate::sync::SyncTracker;
use crate::validation::require;

#[derive(Clone)]
pub struct NoteService {
    store: Arc<dyn NoteStore>,
    cipher: FieldCipher,
    sync: SyncTracker,
}

impl NoteService {
    pub fn new(store: Arc<dyn NoteStore>, cipher: FieldCipher, sync: SyncTracker) -> Self {
        Self {
            store,
            cipher,
            sync,
        }
    }

    /// Store a note with its content and meta sealed.
    ///
    /// # Errors
    ///
    /// [`SecretError::Validation`] when the name or content is empty.
    pub async fn add(&self, owner: Uuid, req: NoteAddRequest) -> Result<Uuid, SecretError> {
        require("name", &req.name).map_err(SecretError::Validation)?;
        require("content", &req.content).map_err(SecretError::Validation)?;

        let sealed = SealedNote {
            content: self.cipher.encrypt_str(&req.content)?,
            meta: self.cipher.encrypt_str(&req.meta)?,
            name: req.name,
        };
        let id = self.store.add(owner, sealed).await?;
        self.sync.notify(owner).await;

        info!(owner_id = %owner, id = %id, "note added");
        Ok(id)
    }

    /// Fetch and unseal a note.
    ///
    /// # Errors
    ///
    /// [`SecretError::NotFound`] for an unknown or foreign id;
    /// [`SecretError::Cipher`] when the sealed content fails verification.
    pub async fn get_secret(&self, owner: Uuid, id: &str) -> Result<NoteSecret, SecretError> {
        let id = parse_id(id)?;
        let sealed = self.store.get(owner, id).await?;
        Ok(NoteSecret {
            content: self.cipher.decrypt_str(&sealed.content)?,
            meta: self.cipher.decrypt_str(&sealed.meta)?,
            name: sealed.name,
        })
    }

    /// Search notes by name.
    ///
    /// # Errors
    ///
    /// [`SecretError::Validation`] for a zero limit.
    pub async fn search(
        &self,
        owner: Uuid,
        req: SearchRequest,
    ) -> Result<SearchResponse<NoteItem>, SecretError> {
        let query = search_query(req)?;
        Ok(self.store.search(owner, &query).await?.into())
    }

    /// Delete a note.
    ///
    /// # Errors
    ///
    /// [`SecretError::NotFound`] for an unknown or foreign id.
    pub async fn remove(&self, owner: Uuid, id: &str) -> Result<Uuid, SecretError> {
        let id = parse_id(id)?;
        self.store.remove(owner, id).await?;
        self.sync.notify(owner).await;

        info!(owner_id = %owner, id = %id, "note removed");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::test_key;
    use crate::storage::memory::MemoryStorage;
    use crate::storage::{MockNoteStore, MockSyncStore, StorageError};

    fn note(name: &str, content: &str) -> NoteAddRequest {
        NoteAddRequest {
            name: name.into(),
            content: content.into(),
            meta: "personal".into(),
        }
    }

    #[tokio::test]
    async fn name_and_content_required() {
        let svc = NoteService::new(
            Arc::new(MockNoteStore::new()),
            FieldCipher::new(test_key()),
            SyncTracker::new(Arc::new(MockSyncStore::new())),
        );
        let owner = Uuid::new_v4();
        assert!(matches!(
            svc.add(owner, note("", "body")).await,
            Err(SecretError::Validation(m)) if m == "name is required"
        ));
        assert!(matches!(
            svc.add(owner, note("todo", "")).await,
            Err(SecretError::Validation(m)) if m == "content is required"
        ));
    }

    #[tokio::test]
    async fn remove_of_missing_note_skips_sync() {
        let mut store = MockNoteStore::new();
        store
            .expect_remove()
            .times(1)
            .returning(|_, _| Err(StorageError::NotFound));
        let svc = NoteService::new(
            Arc::new(store),
            FieldCipher::new(test_key()),
            SyncTracker::new(Arc::new(MockSyncStore::new())),
        );
        let id = Uuid::new_v4().to_string();
        assert!(matches!(
            svc.remove(Uuid::new_v4(), &id).await,
            Err(SecretError::NotFound)
        ));
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_paged() {
        let storage = Arc::new(MemoryStorage::new());
        let svc = NoteService::new(
            storage.clone(),
            FieldCipher::new(test_key()),
            SyncTracker::new(storage),
        );
        let owner = Uuid::new_v4();
        for name in ["Recipes", "recovery codes", "groceries"] {
            svc.add(owner, note(name, "text")).await.unwrap();
        }

        let page = svc
            .search(
                owner,
                SearchRequest {
                    substring: "REC".into(),
                    offset: 0,
                    limit: 1,
                },
            )
            .await
            .unwrap();
        assert_eq!(page.count, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "Recipes");

        let id = page.items[0].id.clone();
        let secret = svc.get_secret(owner, &id).await.unwrap();
        assert_eq!(secret.content, "text");
        assert_eq!(secret.meta, "personal");
    }
}
