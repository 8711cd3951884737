use sqlx::{sqlite::SqliteRow, Row};

use shared::Goal;

use crate::db::DbConnection;
use crate::error::AppResult;

#[derive(Clone)]
pub struct GoalRepository {
    db: DbConnection,
}

impl GoalRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn store(&self, goal: &Goal) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO goals (id, household_id, name, target_amount, current_amount, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&goal.id)
        .bind(&goal.household_id)
        .bind(&goal.name)
        .bind(goal.target_amount)
        .bind(goal.current_amount)
        .bind(&goal.created_at)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    pub async fn get(&self, household_id: &str, id: &str) -> AppResult<Option<Goal>> {
        let row = sqlx::query(
            "SELECT id, household_id, name, target_amount, current_amount, created_at
             FROM goals WHERE household_id = ? AND id = ?",
        )
        .bind(household_id)
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|r| row_to_goal(&r)))
    }

    /// List goals ordered by creation time, most recent first
    pub async fn list(&self, household_id: &str) -> AppResult<Vec<Goal>> {
        let rows = sqlx::query(
            "SELECT id, household_id, name, target_amount, current_amount, created_at
             FROM goals WHERE household_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(household_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(row_to_goal).collect())
    }

    pub async fn update(&self, goal: &Goal) -> AppResult<()> {
        sqlx::query(
            "UPDATE goals SET name = ?, target_amount = ?, current_amount = ?
             WHERE household_id = ? AND id = ?",
        )
        .bind(&goal.name)
        .bind(goal.target_amount)
        .bind(goal.current_amount)
        .bind(&goal.household_id)
        .bind(&goal.id)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Delete a goal; returns whether a row was removed
    pub async fn delete(&self, household_id: &str, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM goals WHERE household_id = ? AND id = ?")
            .bind(household_id)
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_goal(row: &SqliteRow) -> Goal {
    Goal {
        id: row.get("id"),
        household_id: row.get("household_id"),
        name: row.get("name"),
        target_amount: row.get("target_amount"),
        current_amount: row.get("current_amount"),
        created_at: row.get("created_at"),
    }
}
