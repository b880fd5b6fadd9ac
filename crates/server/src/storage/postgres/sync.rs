use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::PgStorage;
use crate::storage::{StorageError, SyncStore};

#[async_trait]
impl SyncStore for PgStorage {
    async fn get(&self, owner: Uuid) -> Result<DateTime<Utc>, StorageError> {
        let updated_at: DateTime<Utc> =
            sqlx::query_scalar("SELECT updated_at FROM sync_markers WHERE owner_id = $1")
                .bind(owner)
                .fetch_one(&self.pool)
                .await?;
        Ok(updated_at)
    }

    async fn set(&self, owner: Uuid) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO sync_markers (owner_id, updated_at) VALUES ($1, now()) \
             ON CONFLICT (owner_id) DO UPDATE \
             SET updated_at = GREATEST(sync_markers.updated_at, EXCLUDED.updated_at)",
        )
        .bind(owner)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
