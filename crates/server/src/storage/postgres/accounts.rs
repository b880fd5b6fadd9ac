use async_trait::async_trait;
use common::protocol::AccountItem;
use sqlx::Row;
use uuid::Uuid;

use super::{like_pattern, page_bounds, total, PgStorage};
use crate::storage::{AccountStore, SealedAccount, SearchPage, SearchQuery, StorageError};

#[async_trait]
impl AccountStore for PgStorage {
    async fn add(&self, owner: Uuid, account: SealedAccount) -> Result<Uuid, StorageError> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO accounts (id, owner_id, login, server, password, meta) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(owner)
        .bind(&account.login)
        .bind(&account.server)
        .bind(&account.password)
        .bind(&account.meta)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn get(&self, owner: Uuid, id: Uuid) -> Result<SealedAccount, StorageError> {
        let row = sqlx::query(
            "SELECT login, server, password, meta FROM accounts WHERE owner_id = $1 AND id = $2",
        )
        .bind(owner)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(SealedAccount {
            login: row.try_get("login")?,
            server: row.try_get("server")?,
            password: row.try_get("password")?,
            meta: row.try_get("meta")?,
        })
    }

    async fn search(
        &self,
        owner: Uuid,
        query: &SearchQuery,
    ) -> Result<SearchPage<AccountItem>, StorageError> {
        let pattern = like_pattern(&query.substring);
        let (offset, limit) = page_bounds(query.offset, query.limit);

        let rows = sqlx::query(
            r"SELECT id, login, server FROM accounts
              WHERE owner_id = $1 AND (login ILIKE $2 ESCAPE '\' OR server ILIKE $2 ESCAPE '\')
              ORDER BY server, login, id
              LIMIT $3 OFFSET $4",
        )
        .bind(owner)
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let count: i64 = sqlx::query_scalar(
            r"SELECT count(*) FROM accounts
              WHERE owner_id = $1 AND (login ILIKE $2 ESCAPE '\' OR server ILIKE $2 ESCAPE '\')",
        )
        .bind(owner)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let items = rows
            .iter()
            .map(|row| {
                Ok(AccountItem {
                    id: row.try_get::<Uuid, _>("id")?.to_string(),
                    login: row.try_get("login")?,
                    server: row.try_get("server")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;
        Ok(SearchPage {
            items,
            total: total(count),
        })
    }

    async fn remove(&self, owner: Uuid, id: Uuid) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM accounts WHERE owner_id = $1 AND id = $2")
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
