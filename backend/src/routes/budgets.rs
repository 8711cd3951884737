use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use tracing::info;

use shared::{BudgetListResponse, BudgetResponse, CreateBudgetRequest, UpdateBudgetRequest};

use crate::auth::AuthSession;
use crate::error::AppResult;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", put(update).delete(delete))
}

pub async fn list(
    State(state): State<AppState>,
    session: AuthSession,
) -> AppResult<Json<BudgetListResponse>> {
    let budgets = state.budgets.list(&session.household_id).await?;
    Ok(Json(BudgetListResponse { budgets }))
}

pub async fn create(
    State(state): State<AppState>,
    session: AuthSession,
    Json(request): Json<CreateBudgetRequest>,
) -> AppResult<impl IntoResponse> {
    info!("POST /api/budgets - request: {:?}", request);
    let budget = state.budgets.create(&session.household_id, request).await?;
    let response = BudgetResponse {
        success_message: format!("Budget for \"{}\" created", budget.category),
        budget,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn update(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<String>,
    Json(request): Json<UpdateBudgetRequest>,
) -> AppResult<Json<BudgetResponse>> {
    info!("PUT /api/budgets/{}", id);
    let budget = state.budgets.update(&session.household_id, &id, request).await?;
    Ok(Json(BudgetResponse {
        success_message: format!("Budget for \"{}\" updated", budget.category),
        budget,
    }))
}

pub async fn delete(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    info!("DELETE /api/budgets/{}", id);
    state.budgets.delete(&session.household_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_session() -> AuthSession {
        AuthSession {
            user_id: "user-1".to_string(),
            member_id: "member-1".to_string(),
            household_id: "h1".to_string(),
            display_name: "Alice".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_list_budgets() {
        let state = AppState::for_tests().await;

        create(
            State(state.clone()),
            test_session(),
            Json(CreateBudgetRequest {
                category: "groceries".to_string(),
                limit_amount: 400.0,
            }),
        )
        .await
        .unwrap();

        let Json(listed) = list(State(state), test_session()).await.unwrap();
        assert_eq!(listed.budgets.len(), 1);
        assert_eq!(listed.budgets[0].limit_amount, 400.0);
    }
}
