use axum::{extract::State, routing::get, Json, Router};

use shared::MemberListResponse;

use crate::auth::AuthSession;
use crate::error::AppResult;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list))
}

pub async fn list(
    State(state): State<AppState>,
    session: AuthSession,
) -> AppResult<Json<MemberListResponse>> {
    let members = state.members.list(&session.household_id).await?;
    Ok(Json(MemberListResponse { members }))
}
