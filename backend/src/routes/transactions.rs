use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use tracing::info;

use shared::{
    BatchCreateTransactionsRequest, CreateTransactionRequest, DeleteTransactionsRequest,
    TransactionListRequest, TransactionListResponse, TransactionResponse,
    UpdateTransactionRequest,
};

use crate::auth::AuthSession;
use crate::error::AppResult;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create).delete(delete_many))
        .route("/batch", post(create_batch))
        .route("/export", get(export))
        .route("/:id", put(update))
}

pub async fn list(
    State(state): State<AppState>,
    session: AuthSession,
    Query(query): Query<TransactionListRequest>,
) -> AppResult<Json<TransactionListResponse>> {
    info!("GET /api/transactions - query: {:?}", query);
    let response = state.transactions.list(&session.household_id, query).await?;
    Ok(Json(response))
}

pub async fn create(
    State(state): State<AppState>,
    session: AuthSession,
    Json(request): Json<CreateTransactionRequest>,
) -> AppResult<impl IntoResponse> {
    info!("POST /api/transactions - request: {:?}", request);
    let transaction = state.transactions.create(&session.household_id, request).await?;
    let response = TransactionResponse {
        success_message: format!("Recorded \"{}\"", transaction.description),
        transaction,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn create_batch(
    State(state): State<AppState>,
    session: AuthSession,
    Json(request): Json<BatchCreateTransactionsRequest>,
) -> AppResult<impl IntoResponse> {
    info!(
        "POST /api/transactions/batch - {} entries",
        request.transactions.len()
    );
    let response = state
        .transactions
        .create_batch(&session.household_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn update(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<String>,
    Json(request): Json<UpdateTransactionRequest>,
) -> AppResult<Json<TransactionResponse>> {
    info!("PUT /api/transactions/{}", id);
    let transaction = state
        .transactions
        .update(&session.household_id, &id, request)
        .await?;
    Ok(Json(TransactionResponse {
        success_message: format!("Updated \"{}\"", transaction.description),
        transaction,
    }))
}

pub async fn delete_many(
    State(state): State<AppState>,
    session: AuthSession,
    Json(request): Json<DeleteTransactionsRequest>,
) -> AppResult<impl IntoResponse> {
    info!(
        "DELETE /api/transactions - {} ids",
        request.transaction_ids.len()
    );
    let response = state
        .transactions
        .delete(&session.household_id, request)
        .await?;
    Ok(Json(response))
}

pub async fn export(
    State(state): State<AppState>,
    session: AuthSession,
) -> AppResult<impl IntoResponse> {
    info!("GET /api/transactions/export");
    let (filename, data) = state
        .export
        .export_transactions_csv(&session.household_id)
        .await?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];
    Ok((headers, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Flow, SpendKind};

    fn test_session() -> AuthSession {
        AuthSession {
            user_id: "user-1".to_string(),
            member_id: "member-1".to_string(),
            household_id: "h1".to_string(),
            display_name: "Alice".to_string(),
        }
    }

    fn create_request() -> CreateTransactionRequest {
        CreateTransactionRequest {
            member: "Alice".to_string(),
            category: "groceries".to_string(),
            kind: SpendKind::Variable,
            flow: Flow::Expense,
            amount: 15.0,
            date: Some("2025-08-02".to_string()),
            description: "Test transaction".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_transaction_handler() {
        let state = AppState::for_tests().await;

        let response = create(State(state), test_session(), Json(create_request()))
            .await
            .unwrap()
            .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_create_transaction_validation_error() {
        let state = AppState::for_tests().await;

        let mut request = create_request();
        request.description = "".to_string();

        let result = create(State(state), test_session(), Json(request)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_list_transactions_handler() {
        let state = AppState::for_tests().await;

        create(State(state.clone()), test_session(), Json(create_request()))
            .await
            .unwrap();

        let Json(listed) = list(
            State(state),
            test_session(),
            Query(TransactionListRequest::default()),
        )
        .await
        .unwrap();
        assert_eq!(listed.transactions.len(), 1);
    }

    #[tokio::test]
    async fn test_export_handler_sets_csv_headers() {
        let state = AppState::for_tests().await;

        let response = export(State(state), test_session())
            .await
            .unwrap()
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("text/csv; charset=utf-8")
        );
    }
}
