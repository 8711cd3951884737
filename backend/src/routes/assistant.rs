use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::info;

use shared::{ChatRequest, ChatResponse, InsightResponse, SuggestionResponse};

use crate::ai::AssistantService;
use crate::auth::AuthSession;
use crate::error::{AppError, AppResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat))
        .route("/insight", get(insight))
        .route("/suggestion", get(suggestion))
}

/// The assistant requires an API key; without one these routes degrade to
/// 503 while the rest of the application keeps working.
fn service(state: &AppState) -> AppResult<&AssistantService> {
    state.assistant.as_ref().ok_or_else(|| {
        AppError::ServiceUnavailable(
            "The assistant is disabled because no generative API key is configured".to_string(),
        )
    })
}

pub async fn chat(
    State(state): State<AppState>,
    session: AuthSession,
    Json(request): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    info!("POST /api/assistant/chat - user: {}", session.user_id);
    let response = service(&state)?.chat(&session.household_id, request).await?;
    Ok(Json(response))
}

pub async fn insight(
    State(state): State<AppState>,
    session: AuthSession,
) -> AppResult<Json<InsightResponse>> {
    info!("GET /api/assistant/insight - user: {}", session.user_id);
    let response = service(&state)?.insight(&session.household_id).await?;
    Ok(Json(response))
}

pub async fn suggestion(
    State(state): State<AppState>,
    session: AuthSession,
) -> AppResult<Json<SuggestionResponse>> {
    info!("GET /api/assistant/suggestion - user: {}", session.user_id);
    let response = service(&state)?.suggestion(&session.household_id).await?;
    Ok(Json(response))
}
