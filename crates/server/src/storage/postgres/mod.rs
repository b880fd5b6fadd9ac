//! PostgreSQL storage backend.
//!
//! One [`PgStorage`] holds the bounded connection pool and implements every
//! store trait; the queries for each secret kind live in their own module.

mod accounts;
mod cards;
mod files;
mod notes;
mod sync;
mod users;

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

use super::StorageError;

/// Storage backed by a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    /// Open a pool of at most `max_connections` connections to `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Apply the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(format!("migration failed: {e}")))
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StorageError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::AlreadyExists,
            other => StorageError::Backend(other.to_string()),
        }
    }
}

/// Build an `ILIKE ... ESCAPE '\'` pattern matching `substring` anywhere.
fn like_pattern(substring: &str) -> String {
    let mut pattern = String::with_capacity(substring.len() + 2);
    pattern.push('%');
    for c in substring.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Offset and limit as the `BIGINT`s PostgreSQL expects.
fn page_bounds(offset: u64, limit: u32) -> (i64, i64) {
    (i64::try_from(offset).unwrap_or(i64::MAX), i64::from(limit))
}

fn total(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_wraps_and_escapes() {
        assert_eq!(like_pattern(""), "%%");
        assert_eq!(like_pattern("test"), "%test%");
        assert_eq!(like_pattern("100%_off"), r"%100\%\_off%");
        assert_eq!(like_pattern(r"C:\keys"), r"%C:\\keys%");
    }

    #[test]
    fn page_bounds_saturate() {
        assert_eq!(page_bounds(u64::MAX, 10), (i64::MAX, 10));
        assert_eq!(page_bounds(20, u32::MAX), (20, i64::from(u32::MAX)));
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert!(matches!(
            StorageError::from(sqlx::Error::RowNotFound),
            StorageError::NotFound
        ));
        assert!(matches!(
            StorageError::from(sqlx::Error::PoolTimedOut),
            StorageError::Backend(_)
        ));
    }
}
