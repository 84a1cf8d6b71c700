use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;
use tracing::{debug, info};

use shared_database::{DatabaseError, SupabaseClient};

use crate::models::{ChatTurn, ConversationRecord};

const TABLE: &str = "conversations";

/// Per-phone conversation rows, written with upsert semantics.
#[derive(Clone)]
pub struct ConversationStore {
    supabase: Arc<SupabaseClient>,
}

impl ConversationStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn load(&self, phone: &str) -> Result<Option<ConversationRecord>, DatabaseError> {
        debug!("Loading conversation for {}", phone);

        let path = format!("/rest/v1/{}?phone=eq.{}&limit=1", TABLE, urlencoding::encode(phone));
        let records: Vec<ConversationRecord> = self.supabase.select(&path).await?;

        Ok(records.into_iter().next())
    }

    /// Suspends automated replies until `until`. The transcript is left as is.
    pub async fn snooze(&self, phone: &str, until: DateTime<Utc>) -> Result<(), DatabaseError> {
        info!("Snoozing automated replies for {} until {}", phone, until);

        self.supabase
            .upsert(
                TABLE,
                "phone",
                json!({
                    "phone": phone,
                    "snoozed_until": until.to_rfc3339_opts(SecondsFormat::Secs, true),
                }),
            )
            .await
    }

    /// Persists the transcript after a reply and lifts any snooze.
    pub async fn save_turn(
        &self,
        phone: &str,
        transcript: &[ChatTurn],
        now: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let transcript = serde_json::to_string(transcript)?;

        self.supabase
            .upsert(
                TABLE,
                "phone",
                json!({
                    "phone": phone,
                    "transcript": transcript,
                    "snoozed_until": null,
                    "last_updated_at": now.to_rfc3339_opts(SecondsFormat::Secs, true),
                }),
            )
            .await
    }
}
