use std::env;
use std::str::FromStr;

use chrono_tz::Tz;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub llm_api_url: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub transcription_api_url: String,
    pub transcription_api_key: String,
    pub transcription_model: String,
    pub zapi_base_url: String,
    pub zapi_instance_id: String,
    pub zapi_token: String,
    pub zapi_client_token: String,
    pub clinic_timezone: Tz,
    pub clinic_name: String,
    pub assistant_name: String,
    pub conversation_stale_hours: i64,
    pub snooze_minutes: i64,
    pub transcript_max_turns: usize,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: required("SUPABASE_URL"),
            supabase_service_key: required("SUPABASE_SERVICE_KEY"),
            llm_api_url: with_default("LLM_API_URL", "https://openrouter.ai/api/v1"),
            llm_api_key: required("OPENROUTER_API_KEY"),
            llm_model: with_default("LLM_MODEL", "openai/gpt-4o"),
            transcription_api_url: with_default("OPENAI_API_URL", "https://api.openai.com/v1"),
            transcription_api_key: required("OPENAI_API_KEY"),
            transcription_model: with_default("TRANSCRIPTION_MODEL", "whisper-1"),
            zapi_base_url: with_default("ZAPI_BASE_URL", "https://api.z-api.io"),
            zapi_instance_id: required("INSTANCE_ID"),
            zapi_token: required("TOKEN"),
            zapi_client_token: required("CLIENT_TOKEN"),
            clinic_timezone: parsed("CLINIC_TIMEZONE", chrono_tz::America::Sao_Paulo),
            clinic_name: with_default("CLINIC_NAME", "Odonto-Sorriso"),
            assistant_name: with_default("ASSISTANT_NAME", "Sofia"),
            conversation_stale_hours: parsed("CONVERSATION_STALE_HOURS", 24),
            snooze_minutes: parsed("SNOOZE_MINUTES", 30),
            transcript_max_turns: parsed("TRANSCRIPT_MAX_TURNS", 20),
            port: parsed("PORT", 3000),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing storage or LLM credentials");
        }
        if !config.is_messaging_configured() {
            warn!("Z-API credentials missing - replies will not be delivered to WhatsApp");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_service_key.is_empty()
            && !self.llm_api_key.is_empty()
    }

    pub fn is_messaging_configured(&self) -> bool {
        !self.zapi_instance_id.is_empty()
            && !self.zapi_token.is_empty()
            && !self.zapi_client_token.is_empty()
    }

    pub fn is_transcription_configured(&self) -> bool {
        !self.transcription_api_key.is_empty()
    }
}

fn required(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        warn!("{} not set, using empty value", key);
        String::new()
    })
}

fn with_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value ({}), using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsed_falls_back_on_garbage() {
        env::set_var("RECEPTIONIST_TEST_BAD_NUMBER", "twenty");
        let value: i64 = parsed("RECEPTIONIST_TEST_BAD_NUMBER", 24);
        assert_eq!(value, 24);
    }

    #[test]
    fn parsed_reads_timezone_names() {
        env::set_var("RECEPTIONIST_TEST_TZ", "America/Manaus");
        let tz: Tz = parsed("RECEPTIONIST_TEST_TZ", chrono_tz::America::Sao_Paulo);
        assert_eq!(tz, chrono_tz::America::Manaus);
    }
}
