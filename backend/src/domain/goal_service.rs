//! Goal service: savings goals tracked by the household.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use tracing::info;

use shared::{CreateGoalRequest, Goal, UpdateGoalRequest};

use crate::db::DbConnection;
use crate::error::{AppError, AppResult};
use crate::storage::GoalRepository;

const MAX_NAME_LEN: usize = 256;

#[derive(Clone)]
pub struct GoalService {
    repository: GoalRepository,
}

impl GoalService {
    pub fn new(db: DbConnection) -> Self {
        Self {
            repository: GoalRepository::new(db),
        }
    }

    pub async fn create(&self, household_id: &str, request: CreateGoalRequest) -> AppResult<Goal> {
        if request.name.trim().is_empty() || request.name.len() > MAX_NAME_LEN {
            return Err(AppError::Validation(
                "Goal name must be between 1 and 256 characters".to_string(),
            ));
        }
        if !request.target_amount.is_finite() || request.target_amount <= 0.0 {
            return Err(AppError::Validation(
                "Target amount must be positive".to_string(),
            ));
        }
        let current_amount = request.current_amount.unwrap_or(0.0);
        if !current_amount.is_finite() || current_amount < 0.0 {
            return Err(AppError::Validation(
                "Current amount must not be negative".to_string(),
            ));
        }

        let now_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?
            .as_millis() as u64;

        let goal = Goal {
            id: Goal::generate_id(now_millis),
            household_id: household_id.to_string(),
            name: request.name,
            target_amount: request.target_amount,
            current_amount,
            created_at: Utc::now().to_rfc3339(),
        };

        self.repository.store(&goal).await?;
        info!("Created goal {} for household {}", goal.id, household_id);

        Ok(goal)
    }

    pub async fn list(&self, household_id: &str) -> AppResult<Vec<Goal>> {
        self.repository.list(household_id).await
    }

    pub async fn update(
        &self,
        household_id: &str,
        id: &str,
        request: UpdateGoalRequest,
    ) -> AppResult<Goal> {
        let mut goal = self
            .repository
            .get(household_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Goal not found: {}", id)))?;

        if let Some(name) = request.name {
            goal.name = name;
        }
        if let Some(target_amount) = request.target_amount {
            goal.target_amount = target_amount;
        }
        if let Some(current_amount) = request.current_amount {
            goal.current_amount = current_amount;
        }

        if goal.name.trim().is_empty() || goal.name.len() > MAX_NAME_LEN {
            return Err(AppError::Validation(
                "Goal name must be between 1 and 256 characters".to_string(),
            ));
        }
        if !goal.target_amount.is_finite() || goal.target_amount <= 0.0 {
            return Err(AppError::Validation(
                "Target amount must be positive".to_string(),
            ));
        }
        if !goal.current_amount.is_finite() || goal.current_amount < 0.0 {
            return Err(AppError::Validation(
                "Current amount must not be negative".to_string(),
            ));
        }

        self.repository.update(&goal).await?;
        Ok(goal)
    }

    pub async fn delete(&self, household_id: &str, id: &str) -> AppResult<()> {
        let deleted = self.repository.delete(household_id, id).await?;
        if !deleted {
            return Err(AppError::NotFound(format!("Goal not found: {}", id)));
        }
        Ok(())
    }
}
