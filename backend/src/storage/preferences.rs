use sqlx::Row;

use crate::db::DbConnection;
use crate::error::AppResult;

/// Per-user key/value store for display preferences such as the theme flag.
#[derive(Clone)]
pub struct PreferenceRepository {
    db: DbConnection,
}

impl PreferenceRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Store a preference value, overwriting any existing value for the key.
    pub async fn put(&self, user_id: &str, key: &str, value: &str) -> AppResult<()> {
        sqlx::query("INSERT OR REPLACE INTO preferences (user_id, key, value) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(key)
            .bind(value)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    /// Retrieve a preference value by key
    pub async fn get(&self, user_id: &str, key: &str) -> AppResult<Option<String>> {
        let row = sqlx::query("SELECT value FROM preferences WHERE user_id = ? AND key = ?")
            .bind(user_id)
            .bind(key)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.map(|r| r.get("value")))
    }
}
