use std::time::Duration;

use reqwest::{header, Client};
use serde_json::{json, Value};
use tracing::{debug, error};

use shared_config::AppConfig;
use shared_models::ClinicError;

use crate::actions::Action;
use crate::models::ChatTurn;

const LLM_TIMEOUT: Duration = Duration::from_secs(60);

pub const TECHNICAL_DIFFICULTIES_REPLY: &str =
    "Desculpe, estou com dificuldades técnicas. Tente novamente em instantes.";

/// Chat-completion client that turns a conversation into an [`Action`].
pub struct LlmClient {
    http_client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl LlmClient {
    pub fn new(config: &AppConfig) -> Self {
        let http_client = Client::builder()
            .timeout(LLM_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            http_client,
            api_url: config.llm_api_url.trim_end_matches('/').to_string(),
            api_key: config.llm_api_key.clone(),
            model: config.llm_model.clone(),
        }
    }

    /// Asks the model for the next action.
    ///
    /// Transport and format failures never escape: they become a
    /// "technical difficulties" reply. An action outside the known set comes
    /// back as `ClinicError::UnknownAction`.
    pub async fn decide(&self, messages: &[ChatTurn]) -> Result<Action, ClinicError> {
        match self.request_decision(messages).await {
            Ok(decision) => Action::from_decision(decision),
            Err(e) => {
                error!("LLM call failed: {}", e);
                Ok(Action::Reply {
                    text: TECHNICAL_DIFFICULTIES_REPLY.to_string(),
                })
            }
        }
    }

    async fn request_decision(&self, messages: &[ChatTurn]) -> Result<Value, ClinicError> {
        debug!("Requesting decision from {} over {} messages", self.model, messages.len());

        let body = json!({
            "model": self.model,
            "messages": messages,
            "response_format": { "type": "json_object" },
        });

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.api_url))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ClinicError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ClinicError::Upstream(format!("LLM API error ({}): {}", status, error_text)));
        }

        let completion: Value = response
            .json()
            .await
            .map_err(|e| ClinicError::Upstream(e.to_string()))?;

        let content = completion["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| ClinicError::Upstream("Invalid completion format".to_string()))?;

        serde_json::from_str(strip_code_fence(content))
            .map_err(|e| ClinicError::Upstream(format!("Decision is not JSON: {}", e)))
    }
}

/// Some models wrap JSON output in a Markdown fence even in JSON mode.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => rest
            .trim_start_matches("json")
            .trim_end()
            .trim_end_matches("```")
            .trim(),
        None => trimmed,
    }
}
