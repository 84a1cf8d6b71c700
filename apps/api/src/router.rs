use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::json;

use whatsapp_cell::api::InboundService;
use whatsapp_cell::whatsapp_routes;

pub fn create_router(inbound: Arc<InboundService>, clinic_name: &str) -> Router {
    let banner = json!({ "message": format!("API do Consultório {} no ar!", clinic_name) });

    Router::new()
        .route(
            "/",
            get(move || {
                let banner = banner.clone();
                async move { Json(banner) }
            })
            .head(|| async {}),
        )
        .merge(whatsapp_routes(inbound))
}
