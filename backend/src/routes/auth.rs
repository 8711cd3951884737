use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::info;

use shared::{LoginRequest, Member, RegisterRequest};

use crate::auth::AuthSession;
use crate::error::{AppError, AppResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/logout", post(logout))
}

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    info!("POST /api/auth/register - email: {}", request.email);
    let response = state.auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    info!("POST /api/auth/login - email: {}", request.email);
    let response = state.auth.login(request).await?;
    Ok(Json(response))
}

pub async fn me(
    State(state): State<AppState>,
    session: AuthSession,
) -> AppResult<Json<Member>> {
    let member = state
        .members
        .profile_for_user(&session.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(Json(member))
}

/// Sessions are stateless bearer tokens; logout is the client discarding
/// its token. The endpoint exists so the SPA has something to call.
pub async fn logout(session: AuthSession) -> Json<serde_json::Value> {
    info!("POST /api/auth/logout - user: {}", session.user_id);
    Json(serde_json::json!({ "success": true }))
}
