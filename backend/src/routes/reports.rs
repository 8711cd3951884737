use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use shared::{MonthKey, MonthlySummary};

use crate::auth::AuthSession;
use crate::error::{AppError, AppResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/monthly", get(monthly))
}

/// Both parts must be given to select a month; otherwise the current month
/// is reported.
#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

pub async fn monthly(
    State(state): State<AppState>,
    session: AuthSession,
    Query(query): Query<MonthQuery>,
) -> AppResult<Json<MonthlySummary>> {
    info!("GET /api/reports/monthly - query: {:?}", query);

    let month = match (query.year, query.month) {
        (Some(year), Some(month)) => {
            if !(1..=12).contains(&month) {
                return Err(AppError::BadRequest(format!("Invalid month: {}", month)));
            }
            MonthKey { year, month }
        }
        _ => MonthKey::default(),
    };

    let summary = state.reports.monthly_summary(&session.household_id, month).await?;
    Ok(Json(summary))
}
