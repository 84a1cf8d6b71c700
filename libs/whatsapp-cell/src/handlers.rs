use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde_json::Value;
use tracing::{debug, warn};

use shared_models::error::AppError;

use crate::models::{ChatRequest, ChatResponse, InboundPayload};
use crate::services::inbound::InboundService;

/// Gateway webhook. Answers 200 for anything that parses as JSON so the
/// gateway does not retry; processing failures are only logged.
#[axum::debug_handler]
pub async fn receive_webhook(
    State(service): State<Arc<InboundService>>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let body: Value = serde_json::from_slice(&body).map_err(|e| {
        warn!("Rejected malformed webhook body: {}", e);
        AppError::BadRequest("Invalid JSON payload".to_string())
    })?;

    let outcome = service.handle(InboundPayload::from_json(&body)).await;
    debug!("Webhook processed: {:?}", outcome);

    Ok(StatusCode::OK)
}

#[axum::debug_handler]
pub async fn chat(
    State(service): State<Arc<InboundService>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let turn = service
        .chat(&request.telefone_usuario, &request.mensagem, request.historico)
        .await;

    Json(ChatResponse { reply: turn.reply })
}
