use sqlx::{sqlite::SqliteRow, Row};

use shared::Budget;

use crate::db::DbConnection;
use crate::error::AppResult;

#[derive(Clone)]
pub struct BudgetRepository {
    db: DbConnection,
}

impl BudgetRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn store(&self, budget: &Budget) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO budgets (id, household_id, category, limit_amount) VALUES (?, ?, ?, ?)",
        )
        .bind(&budget.id)
        .bind(&budget.household_id)
        .bind(&budget.category)
        .bind(budget.limit_amount)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    pub async fn get(&self, household_id: &str, id: &str) -> AppResult<Option<Budget>> {
        let row = sqlx::query(
            "SELECT id, household_id, category, limit_amount
             FROM budgets WHERE household_id = ? AND id = ?",
        )
        .bind(household_id)
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|r| row_to_budget(&r)))
    }

    pub async fn list(&self, household_id: &str) -> AppResult<Vec<Budget>> {
        let rows = sqlx::query(
            "SELECT id, household_id, category, limit_amount
             FROM budgets WHERE household_id = ? ORDER BY category ASC",
        )
        .bind(household_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(row_to_budget).collect())
    }

    pub async fn update(&self, budget: &Budget) -> AppResult<()> {
        sqlx::query(
            "UPDATE budgets SET category = ?, limit_amount = ? WHERE household_id = ? AND id = ?",
        )
        .bind(&budget.category)
        .bind(budget.limit_amount)
        .bind(&budget.household_id)
        .bind(&budget.id)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    pub async fn delete(&self, household_id: &str, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM budgets WHERE household_id = ? AND id = ?")
            .bind(household_id)
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_budget(row: &SqliteRow) -> Budget {
    Budget {
        id: row.get("id"),
        household_id: row.get("household_id"),
        category: row.get("category"),
        limit_amount: row.get("limit_amount"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_budget_crud() {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        let repo = BudgetRepository::new(db);

        let mut budget = Budget {
            id: "budget-1-aaaa".to_string(),
            household_id: "h1".to_string(),
            category: "groceries".to_string(),
            limit_amount: 400.0,
        };
        repo.store(&budget).await.unwrap();

        budget.limit_amount = 450.0;
        repo.update(&budget).await.unwrap();

        let loaded = repo.get("h1", &budget.id).await.unwrap().unwrap();
        assert_eq!(loaded.limit_amount, 450.0);

        assert!(repo.delete("h1", &budget.id).await.unwrap());
        assert!(repo.get("h1", &budget.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_budget_list_sorted_by_category() {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        let repo = BudgetRepository::new(db);

        for (id, category) in [("budget-1-aaaa", "transport"), ("budget-2-aaaa", "groceries")] {
            repo.store(&Budget {
                id: id.to_string(),
                household_id: "h1".to_string(),
                category: category.to_string(),
                limit_amount: 100.0,
            })
            .await
            .unwrap();
        }

        let budgets = repo.list("h1").await.unwrap();
        assert_eq!(budgets[0].category, "groceries");
        assert_eq!(budgets[1].category, "transport");
    }
}
