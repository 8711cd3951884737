//! Member service: household member profiles.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;

use shared::Member;

use crate::db::DbConnection;
use crate::error::{AppError, AppResult};
use crate::storage::MemberRepository;

#[derive(Clone)]
pub struct MemberService {
    repository: MemberRepository,
}

impl MemberService {
    pub fn new(db: DbConnection) -> Self {
        Self {
            repository: MemberRepository::new(db),
        }
    }

    /// Create a member profile for a newly registered user.
    pub async fn create_profile(
        &self,
        user_id: &str,
        household_id: &str,
        display_name: &str,
    ) -> AppResult<Member> {
        if display_name.trim().is_empty() {
            return Err(AppError::Validation(
                "Display name must not be empty".to_string(),
            ));
        }

        let now_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?
            .as_millis() as u64;

        let member = Member {
            id: Member::generate_id(now_millis),
            user_id: user_id.to_string(),
            household_id: household_id.to_string(),
            display_name: display_name.trim().to_string(),
            created_at: Utc::now().to_rfc3339(),
        };

        self.repository.store(&member).await?;
        Ok(member)
    }

    pub async fn profile_for_user(&self, user_id: &str) -> AppResult<Option<Member>> {
        self.repository.get_by_user(user_id).await
    }

    pub async fn list(&self, household_id: &str) -> AppResult<Vec<Member>> {
        self.repository.list_by_household(household_id).await
    }

    pub async fn household_exists(&self, household_id: &str) -> AppResult<bool> {
        self.repository.household_exists(household_id).await
    }
}
