use sqlx::{sqlite::SqliteRow, Row};

use shared::Member;

use crate::db::DbConnection;
use crate::error::AppResult;

#[derive(Clone)]
pub struct MemberRepository {
    db: DbConnection,
}

impl MemberRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn store(&self, member: &Member) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO members (id, user_id, household_id, display_name, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&member.id)
        .bind(&member.user_id)
        .bind(&member.household_id)
        .bind(&member.display_name)
        .bind(&member.created_at)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// The member profile backing an authenticated user, if any
    pub async fn get_by_user(&self, user_id: &str) -> AppResult<Option<Member>> {
        let row = sqlx::query(
            "SELECT id, user_id, household_id, display_name, created_at
             FROM members WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|r| row_to_member(&r)))
    }

    /// All member profiles of a household in creation order
    pub async fn list_by_household(&self, household_id: &str) -> AppResult<Vec<Member>> {
        let rows = sqlx::query(
            "SELECT id, user_id, household_id, display_name, created_at
             FROM members WHERE household_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(household_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(row_to_member).collect())
    }

    /// Whether any member belongs to the given household
    pub async fn household_exists(&self, household_id: &str) -> AppResult<bool> {
        let row = sqlx::query("SELECT 1 FROM members WHERE household_id = ? LIMIT 1")
            .bind(household_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.is_some())
    }
}

fn row_to_member(row: &SqliteRow) -> Member {
    Member {
        id: row.get("id"),
        user_id: row.get("user_id"),
        household_id: row.get("household_id"),
        display_name: row.get("display_name"),
        created_at: row.get("created_at"),
    }
}
