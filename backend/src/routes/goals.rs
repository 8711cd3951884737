use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use tracing::info;

use shared::{CreateGoalRequest, GoalListResponse, GoalResponse, UpdateGoalRequest};

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
) -> AppResult<Json<GoalListResponse>> {
    let goals = state.goals.list(&session.household_id).await?;
    Ok(Json(GoalListResponse { goals }))
}

pub async fn create(
    State(state): State<AppState>,
    session: AuthSession,
    Json(request): Json<CreateGoalRequest>,
) -> AppResult<impl IntoResponse> {
    info!("POST /api/goals - request: {:?}", request);
    let goal = state.goals.create(&session.household_id, request).await?;
    let response = GoalResponse {
        success_message: format!("Goal \"{}\" created", goal.name),
        goal,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn update(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<String>,
    Json(request): Json<UpdateGoalRequest>,
) -> AppResult<Json<GoalResponse>> {
    info!("PUT /api/goals/{}", id);
    let goal = state.goals.update(&session.household_id, &id, request).await?;
    Ok(Json(GoalResponse {
        success_message: format!("Goal \"{}\" updated", goal.name),
        goal,
    }))
}

pub async fn delete(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    info!("DELETE /api/goals/{}", id);
    state.goals.delete(&session.household_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
