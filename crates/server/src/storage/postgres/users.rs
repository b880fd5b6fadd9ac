use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use super::PgStorage;
use crate::storage::{AuthStore, StorageError, UserRecord};

#[async_trait]
impl AuthStore for PgStorage {
    async fn save_user(&self, login: &str, password_hash: &str) -> Result<Uuid, StorageError> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO users (id, login, password_hash) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(login)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    async fn user(&self, login: &str) -> Result<UserRecord, StorageError> {
        let row = sqlx::query("SELECT id, login, password_hash FROM users WHERE login = $1")
            .bind(login)
            .fetch_one(&self.pool)
            .await?;
        Ok(UserRecord {
            id: row.try_get("id")?,
            login: row.try_get("login")?,
            password_hash: row.try_get("password_hash")?,
        })
    }
}
