use std::sync::Arc;

use axum::{routing::post, Router};

use crate::handlers::{chat, receive_webhook};
use crate::services::inbound::InboundService;

pub fn whatsapp_routes(service: Arc<InboundService>) -> Router {
    Router::new()
        .route("/whatsapp", post(receive_webhook))
        .route("/chat", post(chat))
        .with_state(service)
}
