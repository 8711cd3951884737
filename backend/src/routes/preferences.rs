use axum::{
    extract::State,
    routing::get,
    Json, Router,
};

use shared::{Theme, ThemeResponse, UpdateThemeRequest};

use crate::auth::AuthSession;
use crate::error::{AppError, AppResult};
use crate::AppState;

const THEME_KEY: &str = "theme";

pub fn router() -> Router<AppState> {
    Router::new().route("/theme", get(get_theme).put(put_theme))
}

/// Returns 404 while no theme has been stored yet; the SPA then falls back
/// to the OS preference.
pub async fn get_theme(
    State(state): State<AppState>,
    session: AuthSession,
) -> AppResult<Json<ThemeResponse>> {
    let stored = state
        .preferences
        .get(&session.user_id, THEME_KEY)
        .await?
        .ok_or_else(|| AppError::NotFound("No theme preference set".to_string()))?;

    let theme = Theme::parse(&stored).map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    Ok(Json(ThemeResponse { theme }))
}

pub async fn put_theme(
    State(state): State<AppState>,
    session: AuthSession,
    Json(request): Json<UpdateThemeRequest>,
) -> AppResult<Json<ThemeResponse>> {
    state
        .preferences
        .put(&session.user_id, THEME_KEY, request.theme.as_str())
        .await?;
    Ok(Json(ThemeResponse {
        theme: request.theme,
    }))
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
    async fn test_theme_round_trip() {
        let state = AppState::for_tests().await;

        let missing = get_theme(State(state.clone()), test_session()).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        put_theme(
            State(state.clone()),
            test_session(),
            Json(UpdateThemeRequest { theme: Theme::Dark }),
        )
        .await
        .unwrap();

        let Json(stored) = get_theme(State(state), test_session()).await.unwrap();
        assert_eq!(stored.theme, Theme::Dark);
    }
}
