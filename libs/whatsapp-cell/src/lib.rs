pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use router::whatsapp_routes;

pub mod api {
    pub use crate::services::inbound::{InboundOutcome, InboundService};
    pub use crate::services::transcription::Transcriber;
    pub use crate::services::zapi::ZapiClient;
}
