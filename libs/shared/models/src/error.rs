use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use shared_database::DatabaseError;

pub const CLARIFICATION_REPLY: &str = "Não entendi o que preciso fazer. Pode reformular, por favor?";
pub const INTERNAL_ERROR_REPLY: &str = "Ocorreu um erro interno ao processar sua solicitação. Tente novamente em instantes.";

/// HTTP-facing errors for the API surface.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad Request: {0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        tracing::error!("Error: {}: {}", status, message);

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Failures raised while serving a conversation turn.
///
/// The first four variants carry text meant for the patient; the rest are
/// logged and replaced by a generic reply.
#[derive(Error, Debug)]
pub enum ClinicError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl ClinicError {
    pub fn user_message(&self) -> Option<&str> {
        match self {
            ClinicError::Validation(msg) | ClinicError::NotFound(msg) | ClinicError::Conflict(msg) => Some(msg),
            ClinicError::UnknownAction(_) => Some(CLARIFICATION_REPLY),
            ClinicError::Upstream(_) | ClinicError::Database(_) => None,
        }
    }

    /// Text to show the patient, falling back to the generic internal error.
    pub fn reply_text(&self) -> String {
        self.user_message().unwrap_or(INTERNAL_ERROR_REPLY).to_string()
    }
}
