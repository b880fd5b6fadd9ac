use async_trait::async_trait;
use common::protocol::NoteItem;
use sqlx::Row;
use uuid::Uuid;

use super::{like_pattern, page_bounds, total, PgStorage};
use crate::storage::{NoteStore, SealedNote, SearchPage, SearchQuery, StorageError};

#[async_trait]
impl NoteStore for PgStorage {
    async fn add(&self, owner: Uuid, note: SealedNote) -> Result<Uuid, StorageError> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO notes (id, owner_id, name, content, meta) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(owner)
        .bind(&note.name)
        .bind(&note.content)
        .bind(&note.meta)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn get(&self, owner: Uuid, id: Uuid) -> Result<SealedNote, StorageError> {
        let row =
            sqlx::query("SELECT name, content, meta FROM notes WHERE owner_id = $1 AND id = $2")
                .bind(owner)
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(SealedNote {
            name: row.try_get("name")?,
            content: row.try_get("content")?,
            meta: row.try_get("meta")?,
        })
    }

    async fn search(
        &self,
        owner: Uuid,
        query: &SearchQuery,
    ) -> Result<SearchPage<NoteItem>, StorageError> {
        let pattern = like_pattern(&query.substring);
        let (offset, limit) = page_bounds(query.offset, query.limit);

        let rows = sqlx::query(
            r"SELECT id, name FROM notes
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
            r"SELECT count(*) FROM notes WHERE owner_id = $1 AND name ILIKE $2 ESCAPE '\'",
        )
        .bind(owner)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let items = rows
            .iter()
            .map(|row| {
                Ok(NoteItem {
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
        let result = sqlx::query("DELETE FROM notes WHERE owner_id = $1 AND id = $2")
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
