//! Transaction service: create, list, update, and delete household
//! transactions. Validation lives here rather than in the DTO layer.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveDate;
use tracing::info;

use shared::{
    BatchCreateTransactionsRequest, BatchCreateTransactionsResponse, CreateTransactionRequest,
    DeleteTransactionsRequest, DeleteTransactionsResponse, PaginationInfo, Transaction,
    TransactionListRequest, TransactionListResponse, UpdateTransactionRequest,
};

use crate::db::DbConnection;
use crate::error::{AppError, AppResult};
use crate::storage::TransactionRepository;

const MAX_DESCRIPTION_LEN: usize = 256;
const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Clone)]
pub struct TransactionService {
    repository: TransactionRepository,
}

impl TransactionService {
    pub fn new(db: DbConnection) -> Self {
        Self {
            repository: TransactionRepository::new(db),
        }
    }

    /// Create a single transaction and echo back the persisted row.
    pub async fn create(
        &self,
        household_id: &str,
        request: CreateTransactionRequest,
    ) -> AppResult<Transaction> {
        validate_create(&request)?;

        let date = match request.date {
            Some(date) => parse_date(&date)?,
            None => chrono::Local::now().format("%Y-%m-%d").to_string(),
        };

        let now_millis = now_epoch_millis()?;
        let transaction = Transaction {
            id: Transaction::generate_id(request.flow, now_millis),
            household_id: household_id.to_string(),
            member: request.member,
            category: request.category,
            kind: request.kind,
            flow: request.flow,
            amount: request.amount,
            date,
            description: request.description,
        };

        self.repository.store(&transaction).await?;
        info!("Created transaction {} for household {}", transaction.id, household_id);

        Ok(transaction)
    }

    /// Create several transactions in one call (the multi-add screen).
    /// The whole batch is validated before any row is written.
    pub async fn create_batch(
        &self,
        household_id: &str,
        request: BatchCreateTransactionsRequest,
    ) -> AppResult<BatchCreateTransactionsResponse> {
        if request.transactions.is_empty() {
            return Err(AppError::Validation(
                "Batch must contain at least one transaction".to_string(),
            ));
        }
        for entry in &request.transactions {
            validate_create(entry)?;
        }

        let mut created = Vec::with_capacity(request.transactions.len());
        for entry in request.transactions {
            created.push(self.create(household_id, entry).await?);
        }

        let success_message = match created.len() {
            1 => "1 transaction recorded".to_string(),
            n => format!("{} transactions recorded", n),
        };

        Ok(BatchCreateTransactionsResponse {
            created,
            success_message,
        })
    }

    /// List transactions newest first with cursor pagination and optional
    /// date bounds.
    pub async fn list(
        &self,
        household_id: &str,
        request: TransactionListRequest,
    ) -> AppResult<TransactionListResponse> {
        let limit = request.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);

        let mut transactions = self
            .repository
            .list(
                household_id,
                request.start_date.as_deref(),
                request.end_date.as_deref(),
            )
            .await?;

        // Cursor is applied by position; ids are unique so the page after
        // the cursor starts right past it.
        if let Some(after_id) = &request.after {
            if let Some(idx) = transactions.iter().position(|t| &t.id == after_id) {
                transactions = transactions.split_off(idx + 1);
            }
        }

        let has_more = transactions.len() > limit as usize;
        transactions.truncate(limit as usize);

        let next_cursor = if has_more {
            transactions.last().map(|t| t.id.clone())
        } else {
            None
        };

        Ok(TransactionListResponse {
            transactions,
            pagination: PaginationInfo {
                has_more,
                next_cursor,
            },
        })
    }

    /// The most recent transactions, used as assistant context.
    pub async fn recent(&self, household_id: &str, limit: u32) -> AppResult<Vec<Transaction>> {
        self.repository.recent(household_id, limit).await
    }

    /// Apply a partial update to an existing transaction.
    pub async fn update(
        &self,
        household_id: &str,
        id: &str,
        request: UpdateTransactionRequest,
    ) -> AppResult<Transaction> {
        let mut transaction = self
            .repository
            .get(household_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Transaction not found: {}", id)))?;

        if let Some(member) = request.member {
            transaction.member = member;
        }
        if let Some(category) = request.category {
            transaction.category = category;
        }
        if let Some(kind) = request.kind {
            transaction.kind = kind;
        }
        if let Some(flow) = request.flow {
            transaction.flow = flow;
        }
        if let Some(amount) = request.amount {
            transaction.amount = amount;
        }
        if let Some(date) = request.date {
            transaction.date = parse_date(&date)?;
        }
        if let Some(description) = request.description {
            transaction.description = description;
        }

        validate_transaction(&transaction)?;
        self.repository.update(&transaction).await?;
        info!("Updated transaction {} for household {}", transaction.id, household_id);

        Ok(transaction)
    }

    /// Delete transactions by id, reporting the ones that were not found.
    pub async fn delete(
        &self,
        household_id: &str,
        request: DeleteTransactionsRequest,
    ) -> AppResult<DeleteTransactionsResponse> {
        let existing_ids = self
            .repository
            .check_exist(household_id, &request.transaction_ids)
            .await?;
        let not_found_ids: Vec<String> = request
            .transaction_ids
            .iter()
            .filter(|id| !existing_ids.contains(id))
            .cloned()
            .collect();

        let deleted_count = self
            .repository
            .delete_many(household_id, &existing_ids)
            .await? as usize;

        let success_message = match deleted_count {
            0 => "No transactions were deleted".to_string(),
            1 => "1 transaction deleted successfully".to_string(),
            n => format!("{} transactions deleted successfully", n),
        };

        Ok(DeleteTransactionsResponse {
            deleted_count,
            success_message,
            not_found_ids,
        })
    }
}

fn validate_create(request: &CreateTransactionRequest) -> AppResult<()> {
    if request.description.is_empty() || request.description.len() > MAX_DESCRIPTION_LEN {
        return Err(AppError::Validation(
            "Description must be between 1 and 256 characters".to_string(),
        ));
    }
    if request.member.trim().is_empty() {
        return Err(AppError::Validation("Member must not be empty".to_string()));
    }
    if request.category.trim().is_empty() {
        return Err(AppError::Validation("Category must not be empty".to_string()));
    }
    if !request.amount.is_finite() || request.amount <= 0.0 {
        return Err(AppError::Validation("Amount must be positive".to_string()));
    }
    Ok(())
}

fn validate_transaction(transaction: &Transaction) -> AppResult<()> {
    if transaction.description.is_empty() || transaction.description.len() > MAX_DESCRIPTION_LEN {
        return Err(AppError::Validation(
            "Description must be between 1 and 256 characters".to_string(),
        ));
    }
    if transaction.member.trim().is_empty() {
        return Err(AppError::Validation("Member must not be empty".to_string()));
    }
    if transaction.category.trim().is_empty() {
        return Err(AppError::Validation("Category must not be empty".to_string()));
    }
    if !transaction.amount.is_finite() || transaction.amount <= 0.0 {
        return Err(AppError::Validation("Amount must be positive".to_string()));
    }
    Ok(())
}

/// Accepts an ISO date and normalizes it back out, rejecting anything that
/// does not parse as a real calendar date.
fn parse_date(date: &str) -> AppResult<String> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| AppError::Validation(format!("Invalid date: {}", date)))
}

fn now_epoch_millis() -> AppResult<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?
        .as_millis() as u64)
}
