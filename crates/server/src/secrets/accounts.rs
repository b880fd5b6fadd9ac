//! Login/password pairs.

use std::sync::Arc;

use common::protocol::{AccountAddRequest, AccountItem, AccountSecret, SearchRequest, SearchResponse};
use tracing::info;
use uuid::Uuid;

use super::{parse_id, search_query, SecretError};
use crate::crypto::FieldCipher;
use crate::storage::{AccountStore, SealedAccount};
use crate::sync::SyncTracker;

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AccountStore>,
    cipher: FieldCipher,
    sync: SyncTracker,
}

impl AccountService {
    pub fn new(store: Arc<dyn AccountStore>, cipher: FieldCipher, sync: SyncTracker) -> Self {
        Self {
            store,
            cipher,
            sync,
        }
    }

    /// Validate, seal `password` and `meta`, and store a new account for `owner`.
    ///
    /// # Errors
    ///
    /// [`SecretError::Validation`] when `server` is empty or both `login` and
    /// `password` are empty; [`SecretError::Cipher`] or
    /// [`SecretError::Storage`] when sealing or the insert fails.
    pub async fn add(&self, owner: Uuid, req: AccountAddRequest) -> Result<Uuid, SecretError> {
        if req.server.is_empty() {
            return Err(SecretError::validation("server is required"));
        }
        if req.login.is_empty() && req.password.is_empty() {
            return Err(SecretError::validation("login or password is required"));
        }

        let sealed = SealedAccount {
            password: self.cipher.encrypt_str(&req.password)?,
            meta: self.cipher.encrypt_str(&req.meta)?,
            login: req.login,
            server: req.server,
        };
        let id = self.store.add(owner, sealed).await?;
        self.sync.notify(owner).await;

        info!(owner_id = %owner, id = %id, "account added");
        Ok(id)
    }

    /// Fetch and unseal one of `owner`'s accounts.
    ///
    /// # Errors
    ///
    /// [`SecretError::NotFound`] when no account with `id` belongs to `owner`;
    /// [`SecretError::Cipher`] when a stored field fails verification.
    pub async fn get_secret(&self, owner: Uuid, id: &str) -> Result<AccountSecret, SecretError> {
        let id = parse_id(id)?;
        let sealed = self.store.get(owner, id).await?;
        Ok(AccountSecret {
            password: self.cipher.decrypt_str(&sealed.password)?,
            meta: self.cipher.decrypt_str(&sealed.meta)?,
            login: sealed.login,
            server: sealed.server,
        })
    }

    /// Page through `owner`'s accounts matching on login or server.
    ///
    /// # Errors
    ///
    /// [`SecretError::Validation`] for a zero limit; [`SecretError::Storage`]
    /// on backend failure.
    pub async fn search(
        &self,
        owner: Uuid,
        req: SearchRequest,
    ) -> Result<SearchResponse<AccountItem>, SecretError> {
        let query = search_query(req)?;
        Ok(self.store.search(owner, &query).await?.into())
    }

    /// Delete one of `owner`'s accounts and return its id.
    ///
    /// # Errors
    ///
    /// [`SecretError::NotFound`] when no account with `id` belongs to `owner`.
    pub async fn remove(&self, owner: Uuid, id: &str) -> Result<Uuid, SecretError> {
        let id = parse_id(id)?;
        self.store.remove(owner, id).await?;
        self.sync.notify(owner).await;

        info!(owner_id = %owner, id = %id, "account removed");
        Ok(id)
    }
}
