use async_trait::async_trait;
use common::protocol::FileItem;
use sqlx::Row;
use uuid::Uuid;

use super::{like_pattern, page_bounds, total, PgStorage};
use crate::storage::{FileStore, SealedFile, SearchPage, SearchQuery, StorageError};

#[async_trait]
impl FileStore for PgStorage {
    async fn add(&self, owner: Uuid, file: SealedFile) -> Result<Uuid, StorageError> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO files (id, owner_id, name, meta) VALUES ($1, $2, $3, $4)")
            .bind(id)
            .bind(owner)
            .bind(&file.name)
            .bind(&file.meta)
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    async fn get(&self, owner: Uuid, id: Uuid) -> Result<SealedFile, StorageError> {
        let row = sqlx::query("SELECT name, meta FROM files WHERE owner_id = $1 AND id = $2")
            .bind(owner)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(SealedFile {
            name: row.try_get("name")?,
            meta: row.try_get("meta")?,
        })
    }

    async fn name_exists(&self, owner: Uuid, name: &str) -> Result<bool, StorageError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM files WHERE owner_id = $1 AND name = $2)",
        )
        .bind(owner)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn search(
        &self,
        owner: Uuid,
        query: &SearchQuery,
    ) -> Result<SearchPage<FileItem>, StorageError> {
        let pattern = like_pattern(&query.substring);
        let (offset, limit) = page_bounds(query.offset, query.limit);

        let rows = sqlx::query(
            r"SELECT id, name FROM files
              WHERE owner_id = $1 AND name ILIKE $2 ESCAPE '\'
              ORDER BY name, id
              LIMIT $3 OFFSET $4",
        )
        .bind(owner)
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let count: i64 = sqlx::query_scalar(
            r"SELECT count(*) FROM files WHERE owner_id = $1 AND name ILIKE $2 ESCAPE '\'",
        )
        .bind(owner)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let items = rows
            .iter()
            .map(|row| {
                Ok(FileItem {
                    id: row.try_get::<Uuid, _>("id")?.to_string(),
                    name: row.try_get("name")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;
        Ok(SearchPage {
            items,
            total: total(count),
        })
    }

    async fn remove(&self, owner: Uuid, id: Uuid) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM files WHERE owner_id = $1 AND id = $2")
            .bind(owner)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
