use sqlx::{sqlite::SqliteRow, Row};

use shared::{Flow, SpendKind, Transaction};

use crate::db::DbConnection;
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct TransactionRepository {
    db: DbConnection,
}

impl TransactionRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Store a new transaction
    pub async fn store(&self, transaction: &Transaction) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO transactions (id, household_id, member, category, kind, flow, amount, date, description)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.household_id)
        .bind(&transaction.member)
        .bind(&transaction.category)
        .bind(transaction.kind.as_str())
        .bind(transaction.flow.as_str())
        .bind(transaction.amount)
        .bind(&transaction.date)
        .bind(&transaction.description)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Retrieve a single transaction by id, scoped to the household
    pub async fn get(&self, household_id: &str, id: &str) -> AppResult<Option<Transaction>> {
        let row = sqlx::query(
            "SELECT id, household_id, member, category, kind, flow, amount, date, description
             FROM transactions WHERE household_id = ? AND id = ?",
        )
        .bind(household_id)
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(|r| row_to_transaction(&r)).transpose()
    }

    /// List transactions ordered newest first, with optional inclusive date bounds
    pub async fn list(
        &self,
        household_id: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> AppResult<Vec<Transaction>> {
        let mut sql = String::from(
            "SELECT id, household_id, member, category, kind, flow, amount, date, description
             FROM transactions WHERE household_id = ?",
        );
        if start_date.is_some() {
            sql.push_str(" AND date >= ?");
        }
        if end_date.is_some() {
            sql.push_str(" AND date <= ?");
        }
        sql.push_str(" ORDER BY date DESC, id DESC");

        let mut query = sqlx::query(&sql).bind(household_id);
        if let Some(start) = start_date {
            query = query.bind(start);
        }
        if let Some(end) = end_date {
            query = query.bind(end);
        }

        let rows = query.fetch_all(self.db.pool()).await?;
        rows.iter().map(row_to_transaction).collect()
    }

    /// The most recent transactions for a household, newest first
    pub async fn recent(&self, household_id: &str, limit: u32) -> AppResult<Vec<Transaction>> {
        let rows = sqlx::query(
            "SELECT id, household_id, member, category, kind, flow, amount, date, description
             FROM transactions WHERE household_id = ?
             ORDER BY date DESC, id DESC LIMIT ?",
        )
        .bind(household_id)
        .bind(limit as i64)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(row_to_transaction).collect()
    }

    /// Update an existing transaction; the row is rewritten in full
    pub async fn update(&self, transaction: &Transaction) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE transactions
            SET member = ?, category = ?, kind = ?, flow = ?, amount = ?, date = ?, description = ?
            WHERE household_id = ? AND id = ?
            "#,
        )
        .bind(&transaction.member)
        .bind(&transaction.category)
        .bind(transaction.kind.as_str())
        .bind(transaction.flow.as_str())
        .bind(transaction.amount)
        .bind(&transaction.date)
        .bind(&transaction.description)
        .bind(&transaction.household_id)
        .bind(&transaction.id)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Which of the given ids exist for this household
    pub async fn check_exist(
        &self,
        household_id: &str,
        ids: &[String],
    ) -> AppResult<Vec<String>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id FROM transactions WHERE household_id = ? AND id IN ({})",
            placeholders
        );

        let mut query = sqlx::query(&sql).bind(household_id);
        for id in ids {
            query = query.bind(id);
        }

        let rows = query.fetch_all(self.db.pool()).await?;
        Ok(rows.iter().map(|r| r.get("id")).collect())
    }

    /// Delete transactions by id, returning the number actually removed
    pub async fn delete_many(&self, household_id: &str, ids: &[String]) -> AppResult<u32> {
        if ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "DELETE FROM transactions WHERE household_id = ? AND id IN ({})",
            placeholders
        );

        let mut query = sqlx::query(&sql).bind(household_id);
        for id in ids {
            query = query.bind(id);
        }

        let result = query.execute(self.db.pool()).await?;
        Ok(result.rows_affected() as u32)
    }
}

fn row_to_transaction(row: &SqliteRow) -> AppResult<Transaction> {
    let kind: String = row.get("kind");
    let flow: String = row.get("flow");
    Ok(Transaction {
        id: row.get("id"),
        household_id: row.get("household_id"),
        member: row.get("member"),
        category: row.get("category"),
        kind: SpendKind::parse(&kind).map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?,
        flow: Flow::parse(&flow).map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?,
        amount: row.get("amount"),
        date: row.get("date"),
        description: row.get("description"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_transaction(id: &str, household_id: &str, date: &str, amount: f64) -> Transaction {
        Transaction {
            id: id.to_string(),
            household_id: household_id.to_string(),
            member: "Alice".to_string(),
            category: "groceries".to_string(),
            kind: SpendKind::Variable,
            flow: Flow::Expense,
            amount,
            date: date.to_string(),
            description: "Weekly shop".to_string(),
        }
    }

    async fn setup() -> TransactionRepository {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        TransactionRepository::new(db)
    }

    #[tokio::test]
    async fn test_store_and_get() {
        let repo = setup().await;
        let tx = sample_transaction("txn-expense-1-aaaa", "h1", "2025-08-01", 25.0);

        repo.store(&tx).await.expect("Failed to store");

        let loaded = repo.get("h1", &tx.id).await.expect("Failed to get");
        assert_eq!(loaded, Some(tx.clone()));

        // Other households must not see it
        let other = repo.get("h2", &tx.id).await.expect("Failed to get");
        assert!(other.is_none());
    }

    #[tokio::test]
    async fn test_list_orders_newest_first_and_filters_by_date() {
        let repo = setup().await;
        repo.store(&sample_transaction("txn-expense-1-aaaa", "h1", "2025-08-03", 10.0))
            .await
            .unwrap();
        repo.store(&sample_transaction("txn-expense-2-aaaa", "h1", "2025-08-01", 20.0))
            .await
            .unwrap();
        repo.store(&sample_transaction("txn-expense-3-aaaa", "h1", "2025-07-15", 30.0))
            .await
            .unwrap();

        let all = repo.list("h1", None, None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].date, "2025-08-03");
        assert_eq!(all[2].date, "2025-07-15");

        let august = repo
            .list("h1", Some("2025-08-01"), Some("2025-08-31"))
            .await
            .unwrap();
        assert_eq!(august.len(), 2);
    }

    #[tokio::test]
    async fn test_update_rewrites_row() {
        let repo = setup().await;
        let mut tx = sample_transaction("txn-expense-1-aaaa", "h1", "2025-08-01", 25.0);
        repo.store(&tx).await.unwrap();

        tx.amount = 32.5;
        tx.category = "dining".to_string();
        repo.update(&tx).await.unwrap();

        let loaded = repo.get("h1", &tx.id).await.unwrap().unwrap();
        assert_eq!(loaded.amount, 32.5);
        assert_eq!(loaded.category, "dining");
    }

    #[tokio::test]
    async fn test_delete_many_scoped_to_household() {
        let repo = setup().await;
        repo.store(&sample_transaction("txn-expense-1-aaaa", "h1", "2025-08-01", 10.0))
            .await
            .unwrap();
        repo.store(&sample_transaction("txn-expense-2-aaaa", "h2", "2025-08-01", 20.0))
            .await
            .unwrap();

        let ids = vec![
            "txn-expense-1-aaaa".to_string(),
            "txn-expense-2-aaaa".to_string(),
        ];
        let existing = repo.check_exist("h1", &ids).await.unwrap();
        assert_eq!(existing, vec!["txn-expense-1-aaaa".to_string()]);

        let deleted = repo.delete_many("h1", &ids).await.unwrap();
        assert_eq!(deleted, 1);

        // The other household's row survives
        assert!(repo.get("h2", "txn-expense-2-aaaa").await.unwrap().is_some());
    }
}
