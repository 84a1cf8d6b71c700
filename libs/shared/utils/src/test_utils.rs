use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::clock::{FixedClock, SharedClock};

pub struct TestConfig {
    pub supabase_url: String,
    pub llm_api_url: String,
    pub transcription_api_url: String,
    pub zapi_base_url: String,
    pub conversation_stale_hours: i64,
    pub snooze_minutes: i64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            llm_api_url: "http://localhost:54322".to_string(),
            transcription_api_url: "http://localhost:54323".to_string(),
            zapi_base_url: "http://localhost:54324".to_string(),
            conversation_stale_hours: 24,
            snooze_minutes: 30,
        }
    }
}

impl TestConfig {
    /// Points every external collaborator at the same mock server.
    pub fn with_mock_server(uri: &str) -> Self {
        Self {
            supabase_url: uri.to_string(),
            llm_api_url: uri.to_string(),
            transcription_api_url: uri.to_string(),
            zapi_base_url: uri.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: "test-service-key".to_string(),
            llm_api_url: self.llm_api_url.clone(),
            llm_api_key: "test-llm-key".to_string(),
            llm_model: "openai/gpt-4o".to_string(),
            transcription_api_url: self.transcription_api_url.clone(),
            transcription_api_key: "test-stt-key".to_string(),
            transcription_model: "whisper-1".to_string(),
            zapi_base_url: self.zapi_base_url.clone(),
            zapi_instance_id: "test-instance".to_string(),
            zapi_token: "test-token".to_string(),
            zapi_client_token: "test-client-token".to_string(),
            clinic_timezone: chrono_tz::America::Sao_Paulo,
            clinic_name: "Odonto-Sorriso".to_string(),
            assistant_name: "Sofia".to_string(),
            conversation_stale_hours: self.conversation_stale_hours,
            snooze_minutes: self.snooze_minutes,
            transcript_max_turns: 20,
            port: 0,
        }
    }
}

/// A clock frozen at the given RFC 3339 instant.
pub fn fixed_clock(instant: &str) -> SharedClock {
    Arc::new(FixedClock(parse_instant(instant)))
}

pub fn parse_instant(instant: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(instant)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| panic!("invalid test instant {}: {}", instant, e))
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn patient_response(patient_id: &str, full_name: &str, phone: &str) -> Value {
        json!({
            "id": patient_id,
            "full_name": full_name,
            "phone": phone,
            "date_of_birth": null,
            "created_at": "2025-01-01T00:00:00Z"
        })
    }

    pub fn new_patient(full_name: &str, phone: &str) -> Value {
        Self::patient_response(&Uuid::new_v4().to_string(), full_name, phone)
    }

    pub fn appointment_response(patient_id: &str, scheduled_at_utc: &str, procedure: &str, status: &str) -> Value {
        json!({
            "id": Uuid::new_v4().to_string(),
            "patient_id": patient_id,
            "scheduled_at": scheduled_at_utc,
            "procedure": procedure,
            "status": status
        })
    }

    pub fn conversation_response(
        phone: &str,
        transcript: Value,
        last_updated_at: &str,
        snoozed_until: Option<&str>,
    ) -> Value {
        json!({
            "phone": phone,
            "transcript": transcript.to_string(),
            "last_updated_at": last_updated_at,
            "snoozed_until": snoozed_until
        })
    }

    pub fn llm_decision(decision: Value) -> Value {
        json!({
            "id": "chatcmpl-test",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": decision.to_string() },
                "finish_reason": "stop"
            }]
        })
    }
}
