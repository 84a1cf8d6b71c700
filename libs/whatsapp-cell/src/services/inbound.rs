use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, error, info, warn};

use conversation_cell::api::{ConversationStore, Receptionist};
use conversation_cell::{ChatTurn, ConversationState, ConversationTurn};
use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::ClinicError;
use shared_utils::{system_clock, SharedClock};

use crate::models::InboundPayload;
use crate::services::transcription::Transcriber;
use crate::services::zapi::ZapiClient;

/// What happened to one webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    /// No sender phone in the payload.
    Ignored,
    /// Staff wrote from the clinic phone; automation paused.
    Snoozed,
    /// Neither usable text nor a transcribable voice note.
    NoContent,
    /// The conversation is inside a snooze window.
    Suppressed,
    Replied { reply: String },
    Failed,
}

/// Turns gateway webhooks into receptionist turns and sends the answers back.
pub struct InboundService {
    receptionist: Receptionist,
    store: ConversationStore,
    gateway: ZapiClient,
    transcriber: Transcriber,
    clock: SharedClock,
    stale_after: Duration,
    snooze_for: Duration,
}

impl InboundService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_parts(config, Arc::new(SupabaseClient::new(config)), system_clock())
    }

    pub fn with_parts(config: &AppConfig, supabase: Arc<SupabaseClient>, clock: SharedClock) -> Self {
        Self {
            receptionist: Receptionist::with_parts(config, Arc::clone(&supabase), Arc::clone(&clock)),
            store: ConversationStore::new(supabase),
            gateway: ZapiClient::new(config),
            transcriber: Transcriber::new(config),
            clock,
            stale_after: Duration::hours(config.conversation_stale_hours),
            snooze_for: Duration::minutes(config.snooze_minutes),
        }
    }

    /// Stateless turn for the `/chat` endpoint. Nothing is persisted.
    pub async fn chat(&self, phone: &str, message: &str, history: Vec<ChatTurn>) -> ConversationTurn {
        self.receptionist.respond(phone, message, history).await
    }

    /// Processes one webhook delivery. Errors are logged, never returned,
    /// so the gateway always gets a success status.
    pub async fn handle(&self, payload: InboundPayload) -> InboundOutcome {
        let Some(phone) = payload.phone() else {
            debug!("Webhook without sender phone ignored");
            return InboundOutcome::Ignored;
        };

        let outcome = if payload.is_operator_message() {
            self.snooze(phone).await
        } else {
            self.answer(phone, &payload).await
        };

        outcome.unwrap_or_else(|e| {
            error!("Failed to process message from {}: {}", phone, e);
            InboundOutcome::Failed
        })
    }

    async fn snooze(&self, phone: &str) -> Result<InboundOutcome, ClinicError> {
        let until = self.clock.now() + self.snooze_for;
        self.store.snooze(phone, until).await?;
        Ok(InboundOutcome::Snoozed)
    }

    async fn answer(&self, phone: &str, payload: &InboundPayload) -> Result<InboundOutcome, ClinicError> {
        let Some(message) = self.extract_content(payload).await else {
            debug!("Message from {} has no usable content", phone);
            return Ok(InboundOutcome::NoContent);
        };

        let record = self.store.load(phone).await?;
        let history = match ConversationState::resolve(record.as_ref(), self.clock.now(), self.stale_after) {
            ConversationState::Snoozed { until } => {
                info!("Conversation with {} is snoozed until {}, not replying", phone, until);
                return Ok(InboundOutcome::Suppressed);
            }
            ConversationState::NoHistory => Vec::new(),
            ConversationState::InProgress(turns) => turns,
        };

        let turn = self.receptionist.respond(phone, &message, history).await;
        self.store.save_turn(phone, &turn.transcript, self.clock.now()).await?;

        if let Err(e) = self.gateway.send_text(phone, &turn.reply).await {
            error!("Could not deliver reply to {}: {}", phone, e);
        }

        Ok(InboundOutcome::Replied { reply: turn.reply })
    }

    /// Text wins over audio; voice notes are downloaded and transcribed.
    async fn extract_content(&self, payload: &InboundPayload) -> Option<String> {
        if let Some(text) = payload.text_message() {
            return Some(text.to_string());
        }

        let url = payload.audio_url()?;
        info!("Transcribing voice note from {}", url);

        let Some(audio) = self.gateway.download_audio(url).await else {
            warn!("Voice note could not be downloaded");
            return None;
        };
        self.transcriber.transcribe(audio).await
    }
}
