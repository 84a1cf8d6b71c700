use std::time::Duration;

use reqwest::{multipart, Client};
use serde::Deserialize;
use tracing::{debug, error, warn};

use shared_config::AppConfig;
use shared_models::ClinicError;

const TRANSCRIPTION_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

/// Speech-to-text for WhatsApp voice notes (OGG/Opus).
pub struct Transcriber {
    http_client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl Transcriber {
    pub fn new(config: &AppConfig) -> Self {
        let http_client = Client::builder()
            .timeout(TRANSCRIPTION_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            http_client,
            api_url: config.transcription_api_url.trim_end_matches('/').to_string(),
            api_key: config.transcription_api_key.clone(),
            model: config.transcription_model.clone(),
        }
    }

    /// Returns the spoken text, or `None` when the service fails or hears nothing.
    pub async fn transcribe(&self, audio: Vec<u8>) -> Option<String> {
        if self.api_key.is_empty() {
            warn!("Transcription API key missing, audio message ignored");
            return None;
        }

        match self.request_transcription(audio).await {
            Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => {
                warn!("Transcription came back empty");
                None
            }
            Err(e) => {
                error!("Transcription failed: {}", e);
                None
            }
        }
    }

    async fn request_transcription(&self, audio: Vec<u8>) -> Result<String, ClinicError> {
        debug!("Transcribing {} bytes of audio with {}", audio.len(), self.model);

        let part = multipart::Part::bytes(audio)
            .file_name("audio.ogg")
            .mime_str("audio/ogg")
            .map_err(|e| ClinicError::Upstream(e.to_string()))?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone());

        let response = self
            .http_client
            .post(format!("{}/audio/transcriptions", self.api_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClinicError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ClinicError::Upstream(format!(
                "Transcription API error ({}): {}",
                status, error_text
            )));
        }

        let body: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| ClinicError::Upstream(e.to_string()))?;

        Ok(body.text)
    }
}
