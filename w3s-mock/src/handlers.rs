/// Axum HTTP handlers for the W3S user-controlled wallet endpoints

use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::backend::{MockBackend, MockError};
use crate::types::*;

/// Shared application state
pub type AppState = Arc<MockBackend>;

const USER_TOKEN_HEADER: &str = "X-User-Token";

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        log::debug!("Rejecting request: {} ({})", self, status);
        let body = ErrorBody {
            code: self.code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn user_token(headers: &HeaderMap) -> Option<&str> {
    headers.get(USER_TOKEN_HEADER).and_then(|v| v.to_str().ok())
}

/// Check the API key and resolve the caller from `X-User-Token`
fn authenticate_user(backend: &MockBackend, headers: &HeaderMap) -> Result<String, MockError> {
    backend.check_api_key(bearer(headers))?;
    backend.user_for_token(user_token(headers))
}

/// POST /v1/w3s/users
/// Creates a user; 201 with an empty body
pub async fn create_user(
    State(backend): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<UserRequest>,
) -> Result<StatusCode, MockError> {
    backend.check_api_key(bearer(&headers))?;
    backend.create_user(&req.user_id)?;
    Ok(StatusCode::CREATED)
}

/// POST /v1/w3s/users/token
/// Issues a user token and encryption key
pub async fn create_session(
    State(backend): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<UserRequest>,
) -> Result<Json<DataEnvelope<SessionTokenResponse>>, MockError> {
    backend.check_api_key(bearer(&headers))?;
    let session = backend.create_session(&req.user_id)?;
    Ok(Json(DataEnvelope::new(session)))
}

/// POST /v1/w3s/user/initialize
/// Returns the challenge that creates the user's first wallet
pub async fn initialize_user(
    State(backend): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<InitializeRequest>,
) -> Result<(StatusCode, Json<DataEnvelope<ChallengeIdResponse>>), MockError> {
    let user_id = authenticate_user(&backend, &headers)?;
    let challenge = backend.initialize(&user_id, req)?;
    Ok((StatusCode::CREATED, Json(DataEnvelope::new(challenge))))
}

/// GET /v1/w3s/wallets?blockchain=&pageSize=
pub async fn list_wallets(
    State(backend): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<WalletQuery>,
) -> Result<Json<DataEnvelope<WalletsResponse>>, MockError> {
    let user_id = authenticate_user(&backend, &headers)?;
    Ok(Json(DataEnvelope::new(backend.list_wallets(&user_id, &query))))
}

/// GET /v1/w3s/wallets/{id}/balances
/// Only the API key is required here
pub async fn get_balances(
    State(backend): State<AppState>,
    headers: HeaderMap,
    Path(wallet_id): Path<String>,
) -> Result<Json<DataEnvelope<BalancesResponse>>, MockError> {
    backend.check_api_key(bearer(&headers))?;
    let balances = backend.balances(&wallet_id)?;
    Ok(Json(DataEnvelope::new(balances)))
}

/// POST /v1/w3s/user/transactions/transfer
pub async fn create_transfer(
    State(backend): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<TransferRequest>,
) -> Result<(StatusCode, Json<DataEnvelope<ChallengeIdResponse>>), MockError> {
    let user_id = authenticate_user(&backend, &headers)?;
    let challenge = backend.create_transfer(&user_id, req)?;
    Ok((StatusCode::CREATED, Json(DataEnvelope::new(challenge))))
}

/// GET /v1/w3s/transactions?blockchain=&custodyType=&operation=&pageSize=
pub async fn list_transactions(
    State(backend): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<DataEnvelope<TransactionsResponse>>, MockError> {
    let user_id = authenticate_user(&backend, &headers)?;
    Ok(Json(DataEnvelope::new(
        backend.list_transactions(&user_id, &query),
    )))
}

// ============================================================================
// TEST HELPER ENDPOINTS (not part of the W3S API)
// ============================================================================

/// POST /mock/challenges/{id}/complete
/// Completes a pending challenge as the SDK would after PIN entry
pub async fn complete_challenge(
    State(backend): State<AppState>,
    Path(challenge_id): Path<String>,
) -> Result<StatusCode, MockError> {
    backend.complete_challenge(&challenge_id)?;
    log::info!("Completed challenge {}", challenge_id);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /mock/wallets/{id}/fund
pub async fn fund_wallet(
    State(backend): State<AppState>,
    Path(wallet_id): Path<String>,
    Json(req): Json<FundRequest>,
) -> Result<StatusCode, MockError> {
    backend.fund_wallet(&wallet_id, &req.token_id, req.amount)?;
    log::info!("Funded {} with {} of {}", wallet_id, req.amount, req.token_id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
