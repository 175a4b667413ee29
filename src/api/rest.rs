use axum::{
    Router,
    routing::{get, post, put},
    extract::{Path, State, Json},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use prometheus::{Encoder, Registry, TextEncoder};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::query::MovementQuery;
use crate::error::Error;
use crate::movement::FundsMovementOrchestrator;
use crate::movement::outcome::MovementOutcome;
use crate::movement::record::MovementRecord;
use crate::movement::request::{CommandContext, DebitRequest, TransferRequest, TransferUpdateRequest};
use crate::types::account::AccountBalance;
use crate::types::balance::Balance;
use crate::types::ids::{AccountId, MovementId};

pub struct ApiState {
    pub orchestrator: FundsMovementOrchestrator,
    pub query: MovementQuery,
    pub registry: Registry,
    pub request_timeout: Duration,
}

impl ApiState {
    fn context(&self) -> CommandContext {
        CommandContext::with_timeout(self.request_timeout)
    }
}

pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/transfers", post(create_transfer))
        .route("/transfers/:id", put(update_transfer))
        .route("/transactions", post(create_transaction))
        .route("/movements/:id", get(get_movement).delete(trash_movement))
        .route("/movements/:id/restore", post(restore_movement))
        .route("/balances/:account_id", get(get_balance))
        .with_state(state)
}

/// Maps core errors onto HTTP responses.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidAmount(_) | Error::SameParty(_) => StatusCode::BAD_REQUEST,
            Error::PartyNotFound(_) => StatusCode::NOT_FOUND,
            Error::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,
            Error::MovementNotAmendable { .. } => StatusCode::CONFLICT,
            Error::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            Error::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "error": self.0.kind(),
            "message": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

async fn health_check() -> &'static str {
    "OK"
}

async fn metrics(State(state): State<Arc<ApiState>>) -> Response {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&state.registry.gather(), &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }
    ([(header::CONTENT_TYPE, encoder.format_type().to_string())], buffer).into_response()
}

async fn create_transfer(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<TransferRequest>,
) -> ApiResult<(StatusCode, Json<MovementOutcome>)> {
    let outcome = state.orchestrator.execute_transfer(&state.context(), req).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

#[derive(Deserialize)]
struct AmountUpdate {
    amount: Balance,
}

async fn update_transfer(
    State(state): State<Arc<ApiState>>,
    Path(movement_id): Path<MovementId>,
    Json(body): Json<AmountUpdate>,
) -> ApiResult<Json<MovementOutcome>> {
    let req = TransferUpdateRequest {
        movement_id,
        new_amount: body.amount,
    };
    let outcome = state.orchestrator.execute_transfer_update(&state.context(), req).await?;
    Ok(Json(outcome))
}

async fn create_transaction(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<DebitRequest>,
) -> ApiResult<(StatusCode, Json<MovementOutcome>)> {
    let outcome = state.orchestrator.execute_debit(&state.context(), req).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn get_movement(
    State(state): State<Arc<ApiState>>,
    Path(movement_id): Path<MovementId>,
) -> ApiResult<Json<MovementRecord>> {
    Ok(Json(state.query.find_movement(&movement_id).await?))
}

async fn trash_movement(
    State(state): State<Arc<ApiState>>,
    Path(movement_id): Path<MovementId>,
) -> ApiResult<Json<MovementOutcome>> {
    Ok(Json(state.orchestrator.trash_movement(movement_id).await?))
}

async fn restore_movement(
    State(state): State<Arc<ApiState>>,
    Path(movement_id): Path<MovementId>,
) -> ApiResult<Json<MovementOutcome>> {
    Ok(Json(state.orchestrator.restore_movement(movement_id).await?))
}

async fn get_balance(
    State(state): State<Arc<ApiState>>,
    Path(account_id): Path<AccountId>,
) -> ApiResult<Json<AccountBalance>> {
    Ok(Json(state.query.find_balance(&account_id).await?))
}
