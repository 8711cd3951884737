//! Budget service: per-category monthly spending limits.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::info;

use shared::{Budget, CreateBudgetRequest, UpdateBudgetRequest};

use crate::db::DbConnection;
use crate::error::{AppError, AppResult};
use crate::storage::BudgetRepository;

#[derive(Clone)]
pub struct BudgetService {
    repository: BudgetRepository,
}

impl BudgetService {
    pub fn new(db: DbConnection) -> Self {
        Self {
            repository: BudgetRepository::new(db),
        }
    }

    pub async fn create(
        &self,
        household_id: &str,
        request: CreateBudgetRequest,
    ) -> AppResult<Budget> {
        if request.category.trim().is_empty() {
            return Err(AppError::Validation("Category must not be empty".to_string()));
        }
        if !request.limit_amount.is_finite() || request.limit_amount <= 0.0 {
            return Err(AppError::Validation(
                "Budget limit must be positive".to_string(),
            ));
        }

        let now_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?
            .as_millis() as u64;

        let budget = Budget {
            id: Budget::generate_id(now_millis),
            household_id: household_id.to_string(),
            category: request.category,
            limit_amount: request.limit_amount,
        };

        self.repository.store(&budget).await?;
        info!("Created budget {} for household {}", budget.id, household_id);

        Ok(budget)
    }

    pub async fn list(&self, household_id: &str) -> AppResult<Vec<Budget>> {
        self.repository.list(household_id).await
    }

    pub async fn update(
        &self,
        household_id: &str,
        id: &str,
        request: UpdateBudgetRequest,
    ) -> AppResult<Budget> {
        let mut budget = self
            .repository
            .get(household_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Budget not found: {}", id)))?;

        if let Some(category) = request.category {
            budget.category = category;
        }
        if let Some(limit_amount) = request.limit_amount {
            budget.limit_amount = limit_amount;
        }

        if budget.category.trim().is_empty() {
            return Err(AppError::Validation("Category must not be empty".to_string()));
        }
        if !budget.limit_amount.is_finite() || budget.limit_amount <= 0.0 {
            return Err(AppError::Validation(
                "Budget limit must be positive".to_string(),
            ));
        }

        self.repository.update(&budget).await?;
        Ok(budget)
    }

    pub async fn delete(&self, household_id: &str, id: &str) -> AppResult<()> {
        let deleted = self.repository.delete(household_id, id).await?;
        if !deleted {
            return Err(AppError::NotFound(format!("Budget not found: {}", id)));
        }
        Ok(())
    }
}
