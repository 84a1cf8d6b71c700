pub mod actions;
pub mod models;
pub mod services;

pub use actions::Action;
pub use models::*;

pub mod api {
    pub use crate::services::llm::LlmClient;
    pub use crate::services::orchestrator::Receptionist;
    pub use crate::services::prompt::ClinicProfile;
    pub use crate::services::store::ConversationStore;
}
