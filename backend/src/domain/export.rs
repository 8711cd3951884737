//! Export service: the household's transactions as a CSV download.

use chrono::Utc;
use tracing::info;

use crate::db::DbConnection;
use crate::error::{AppError, AppResult};
use crate::storage::TransactionRepository;

#[derive(Clone)]
pub struct ExportService {
    transactions: TransactionRepository,
}

impl ExportService {
    pub fn new(db: DbConnection) -> Self {
        Self {
            transactions: TransactionRepository::new(db),
        }
    }

    /// Render every transaction of the household as CSV, newest first.
    /// Returns the suggested filename and the file contents.
    pub async fn export_transactions_csv(
        &self,
        household_id: &str,
    ) -> AppResult<(String, Vec<u8>)> {
        let transactions = self.transactions.list(household_id, None, None).await?;
        info!(
            "Exporting {} transactions for household {}",
            transactions.len(),
            household_id
        );

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record([
                "date",
                "member",
                "category",
                "kind",
                "flow",
                "amount",
                "description",
            ])
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

        for tx in &transactions {
            writer
                .write_record([
                    tx.date.as_str(),
                    tx.member.as_str(),
                    tx.category.as_str(),
                    tx.kind.as_str(),
                    tx.flow.as_str(),
                    &format!("{:.2}", tx.amount),
                    tx.description.as_str(),
                ])
                .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
        }

        let data = writer
            .into_inner()
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

        let filename = format!("transactions-{}.csv", Utc::now().format("%Y-%m-%d"));
        Ok((filename, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Flow, SpendKind, Transaction};

    #[tokio::test]
    async fn test_export_contains_header_and_rows() {
        let db = DbConnection::init_test().await.expect("Failed to init test DB");
        let repo = TransactionRepository::new(db.clone());
        let service = ExportService::new(db);

        repo.store(&Transaction {
            id: "txn-expense-1-aaaa".to_string(),
            household_id: "h1".to_string(),
            member: "Alice".to_string(),
            category: "groceries".to_string(),
            kind: SpendKind::Variable,
            flow: Flow::Expense,
            amount: 42.5,
            date: "2025-08-02".to_string(),
            description: "Weekly shop".to_string(),
        })
        .await
        .unwrap();

        let (filename, data) = service.export_transactions_csv("h1").await.unwrap();
        assert!(filename.starts_with("transactions-"));
        assert!(filename.ends_with(".csv"));

        let text = String::from_utf8(data).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "date,member,category,kind,flow,amount,description"
        );
        assert_eq!(
            lines.next().unwrap(),
            "2025-08-02,Alice,groceries,variable,expense,42.50,Weekly shop"
        );
        assert!(lines.next().is_none());
    }

    #[tokio::test]
    async fn test_export_empty_household_has_only_header() {
        let db = DbConnection::init_test().await.expect("Failed to init test DB");
        let service = ExportService::new(db);

        let (_, data) = service.export_transactions_csv("h1").await.unwrap();
        let text = String::from_utf8(data).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
