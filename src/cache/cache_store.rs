use chrono::Utc;
use diesel::prelude::*;
use std::sync::Arc;

use super::cache_errors::CacheError;
use crate::db::{get_connection, DbPool};
use crate::schema::cache_entries;

pub type CacheStoreResult<T> = std::result::Result<T, CacheError>;

/// The persisted key/value tier behind the cache. Implementations surface
/// storage-quota failures as `CacheError::QuotaExceeded` so the service can
/// sweep and retry.
pub trait CacheStoreTrait: Send + Sync {
    fn read(&self, key: &str) -> CacheStoreResult<Option<String>>;
    fn write(&self, key: &str, payload: &str) -> CacheStoreResult<()>;
    fn remove(&self, key: &str) -> CacheStoreResult<()>;
    fn keys_with_prefix(&self, prefix: &str) -> CacheStoreResult<Vec<String>>;
}

#[derive(Queryable, Selectable, Insertable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::cache_entries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
struct CacheEntryDB {
    cache_key: String,
    payload: String,
    written_at: chrono::NaiveDateTime,
}

/// Persisted cache rows in SQLite, alongside the rest of the user's data.
pub struct SqliteCacheStore {
    pool: Arc<DbPool>,
}

impl SqliteCacheStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    fn classify_write_error(err: diesel::result::Error) -> CacheError {
        let message = err.to_string();
        if message.to_lowercase().contains("full") {
            CacheError::QuotaExceeded(message)
        } else {
            CacheError::DatabaseError(message)
        }
    }
}

impl CacheStoreTrait for SqliteCacheStore {
    fn read(&self, key: &str) -> CacheStoreResult<Option<String>> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        cache_entries::table
            .filter(cache_entries::cache_key.eq(key))
            .select(cache_entries::payload)
            .first::<String>(&mut conn)
            .optional()
            .map_err(|e| CacheError::DatabaseError(e.to_string()))
    }

    fn write(&self, key: &str, payload: &str) -> CacheStoreResult<()> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        let row = CacheEntryDB {
            cache_key: key.to_string(),
            payload: payload.to_string(),
            written_at: Utc::now().naive_utc(),
        };

        diesel::replace_into(cache_entries::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(Self::classify_write_error)?;

        Ok(())
    }

    fn remove(&self, key: &str) -> CacheStoreResult<()> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        diesel::delete(cache_entries::table.filter(cache_entries::cache_key.eq(key)))
            .execute(&mut conn)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> CacheStoreResult<Vec<String>> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        // SQLite LIKE treats '_' as a wildcard and namespaces contain it, so
        // the prefix match happens here instead.
        let keys = cache_entries::table
            .select(cache_entries::cache_key)
            .load::<String>(&mut conn)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        Ok(keys
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect())
    }
}
