//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::auth::{AuthService, TokenService};
use crate::blob::{BlobStore, MemoryBlobStore};
use crate::crypto::{BlobCipher, FieldCipher};
use crate::secrets::{AccountService, CardService, FileService, NoteService};
use crate::storage::memory::MemoryStorage;
use crate::storage::{AccountStore, AuthStore, CardStore, FileStore, NoteStore, SyncStore};
use crate::sync::SyncTracker;

use super::access::AccessTable;

/// Storage collaborators, one narrow handle per consumer.
#[derive(Clone)]
pub struct Backends {
    pub users: Arc<dyn AuthStore>,
    pub accounts: Arc<dyn AccountStore>,
    pub cards: Arc<dyn CardStore>,
    pub notes: Arc<dyn NoteStore>,
    pub files: Arc<dyn FileStore>,
    pub sync: Arc<dyn SyncStore>,
    pub blobs: Arc<dyn BlobStore>,
}

impl Backends {
    /// Hand out one storage implementation behind every store trait.
    pub fn from_storage<S>(storage: Arc<S>, blobs: Arc<dyn BlobStore>) -> Self
    where
        S: AuthStore + AccountStore + CardStore + NoteStore + FileStore + SyncStore + 'static,
    {
        Self {
            users: storage.clone(),
            accounts: storage.clone(),
            cards: storage.clone(),
            notes: storage.clone(),
            files: storage.clone(),
            sync: storage,
            blobs,
        }
    }

    /// Process-local backends; nothing survives a restart.
    pub fn in_memory() -> Self {
        Self::from_storage(Arc::new(MemoryStorage::new()), Arc::new(MemoryBlobStore::new()))
    }
}

/// Application state shared across all request handlers.
///
/// Every field is `Arc`-backed, so Axum's per-request clone is cheap.
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenService>,
    pub access: Arc<AccessTable>,
    pub auth: AuthService,
    pub accounts: AccountService,
    pub cards: CardService,
    pub notes: NoteService,
    pub files: FileService,
    pub sync: SyncTracker,
}

impl AppState {
    pub fn new(
        backends: Backends,
        fields: FieldCipher,
        contents: BlobCipher,
        tokens: Arc<TokenService>,
        access: AccessTable,
    ) -> Self {
        let sync = SyncTracker::new(backends.sync);
        Self {
            auth: AuthService::new(backends.users, tokens.clone()),
            accounts: AccountService::new(backends.accounts, fields.clone(), sync.clone()),
            cards: CardService::new(backends.cards, fields.clone(), sync.clone()),
            notes: NoteService::new(backends.notes, fields.clone(), sync.clone()),
            files: FileService::new(backends.files, backends.blobs, fields, contents, sync.clone()),
            sync,
            tokens,
            access: Arc::new(access),
        }
    }
}
