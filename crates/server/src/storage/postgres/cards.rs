use async_trait::async_trait;
use common::protocol::CardItem;
use sqlx::Row;
use uuid::Uuid;

use super::{like_pattern, page_bounds, total, PgStorage};
use crate::storage::{CardStore, SealedCard, SearchPage, SearchQuery, StorageError};

#[async_trait]
impl CardStore for PgStorage {
    async fn add(&self, owner: Uuid, card: SealedCard) -> Result<Uuid, StorageError> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO cards (id, owner_id, name, mask, number, month, year, cvc, pin) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(id)
        .bind(owner)
        .bind(&card.name)
        .bind(&card.mask)
        .bind(&card.number)
        .bind(card.month)
        .bind(card.year)
        .bind(&card.cvc)
        .bind(&card.pin)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn get(&self, owner: Uuid, id: Uuid) -> Result<SealedCard, StorageError> {
        let row = sqlx::query(
            "SELECT name, mask, number, month, year, cvc, pin FROM cards \
             WHERE owner_id = $1 AND id = $2",
        )
        .bind(owner)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(SealedCard {
            name: row.try_get("name")?,
            mask: row.try_get("mask")?,
            number: row.try_get("number")?,
            month: row.try_get("month")?,
            year: row.try_get("year")?,
            cvc: row.try_get("cvc")?,
            pin: row.try_get("pin")?,
        })
    }

    async fn search(
        &self,
        owner: Uuid,
        query: &SearchQuery,
    ) -> Result<SearchPage<CardItem>, StorageError> {
        let pattern = like_pattern(&query.substring);
        let (offset, limit) = page_bounds(query.offset, query.limit);

        let rows = sqlx::query(
            r"SELECT id, name, mask FROM cards
              WHERE owner_id = $1 AND (name ILIKE $2 ESCAPE '\' OR mask ILIKE $2 ESCAPE '\')
              ORDER BY name, mask, id
              LIMIT $3 OFFSET $4",
        )
        .bind(owner)
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let count: i64 = sqlx::query_scalar(
            r"SELECT count(*) FROM cards
              WHERE owner_id = $1 AND (name ILIKE $2 ESCAPE '\' OR mask ILIKE $2 ESCAPE '\')",
        )
        .bind(owner)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let items = rows
            .iter()
            .map(|row| {
                Ok(CardItem {
                    id: row.try_get::<Uuid, _>("id")?.to_string(),
                    name: row.try_get("name")?,
                    mask: row.try_get("mask")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;
        Ok(SearchPage {
            items,
            total: total(count),
        })
    }

    async fn remove(&self, owner: Uuid, id: Uuid) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM cards WHERE owner_id = $1 AND id = $2")
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
