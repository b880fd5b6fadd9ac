//! Registration, login and the token service behind them.

pub mod password;
pub mod token;

pub use token::TokenService;

use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::storage::{AuthStore, StorageError};

/// Role granted to every registered principal.
pub const USER_ROLE: &str = "user";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    /// Unknown login or wrong password; deliberately not distinguished.
    #[error("invalid login or password")]
    InvalidCredentials,

    #[error("user already exists")]
    AlreadyExists,

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error(transparent)]
    Storage(StorageError),
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn AuthStore>,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(store: Arc<dyn AuthStore>, tokens: Arc<TokenService>) -> Self {
        Self { store, tokens }
    }

    /// Create a principal and return its id.
    pub async fn register(&self, login: &str, password: &str) -> Result<Uuid, AuthError> {
        check_credentials(login, password)?;

        let hash = password::hash_password(password.to_owned()).await?;
        let id = self
            .store
            .save_user(login, &hash)
            .await
            .map_err(|e| match e {
                StorageError::AlreadyExists => AuthError::AlreadyExists,
                other => AuthError::Storage(other),
            })?;

        info!(owner_id = %id, "user registered");
        Ok(id)
    }

    /// Check credentials and issue a token carrying [`USER_ROLE`].
    pub async fn login(&self, login: &str, password: &str) -> Result<String, AuthError> {
        check_credentials(login, password)?;

        let user = self.store.user(login).await.map_err(|e| match e {
            StorageError::NotFound => AuthError::InvalidCredentials,
            other => AuthError::Storage(other),
        })?;
        if !password::verify_password(password.to_owned(), user.password_hash).await? {
            return Err(AuthError::InvalidCredentials);
        }

        info!(owner_id = %user.id, "user logged in");
        Ok(self.tokens.generate(&user.id.to_string(), USER_ROLE))
    }
}

fn check_credentials(login: &str, password: &str) -> Result<(), AuthError> {
    if login.is_empty() {
        return Err(AuthError::Validation("login is required".into()));
    }
    if password.is_empty() {
        return Err(AuthError::Validation("password is required".into()));
    }
    Ok(())
}
