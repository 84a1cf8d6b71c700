use serde::{Deserialize, Serialize};
use serde_json::Value;

use conversation_cell::ChatTurn;

/// Webhook body posted by the WhatsApp gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundPayload {
    pub phone: Option<String>,
    pub from_me: Option<bool>,
    pub text: Option<TextContent>,
    pub audio: Option<AudioContent>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextContent {
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioContent {
    pub audio_url: Option<String>,
}

impl InboundPayload {
    /// Reads the fields the receptionist needs from any JSON value. Unknown
    /// fields are ignored and fields of the wrong type count as absent;
    /// numeric phones are accepted.
    pub fn from_json(body: &Value) -> Self {
        let phone = match body.get("phone") {
            Some(Value::String(phone)) => Some(phone.clone()),
            Some(Value::Number(phone)) => Some(phone.to_string()),
            _ => None,
        };

        Self {
            phone,
            from_me: body.get("fromMe").and_then(Value::as_bool),
            text: body.get("text").map(|text| TextContent {
                message: string_field(text, "message"),
            }),
            audio: body.get("audio").map(|audio| AudioContent {
                audio_url: string_field(audio, "audioUrl"),
            }),
        }
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }

    /// Messages typed by the clinic staff on the connected phone.
    pub fn is_operator_message(&self) -> bool {
        self.from_me.unwrap_or(false)
    }

    pub fn text_message(&self) -> Option<&str> {
        self.text
            .as_ref()
            .and_then(|t| t.message.as_deref())
            .filter(|m| !m.trim().is_empty())
    }

    pub fn audio_url(&self) -> Option<&str> {
        self.audio
            .as_ref()
            .and_then(|a| a.audio_url.as_deref())
            .filter(|u| !u.trim().is_empty())
    }
}

fn string_field(object: &Value, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_string)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub telefone_usuario: String,
    pub mensagem: String,
    #[serde(default)]
    pub historico: Vec<ChatTurn>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage<'a> {
    pub phone: &'a str,
    pub message: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_gateway_text_payload() {
        let payload = InboundPayload::from_json(&json!({
            "phone": "5511999990000",
            "fromMe": false,
            "isGroup": false,
            "text": { "message": "Oi" }
        }));

        assert_eq!(payload.phone(), Some("5511999990000"));
        assert!(!payload.is_operator_message());
        assert_eq!(payload.text_message(), Some("Oi"));
        assert_eq!(payload.audio_url(), None);
    }

    #[test]
    fn decodes_gateway_audio_payload() {
        let payload = InboundPayload::from_json(&json!({
            "phone": "5511999990000",
            "audio": { "audioUrl": "https://cdn.example/audio.ogg", "seconds": 4 }
        }));

        assert_eq!(payload.audio_url(), Some("https://cdn.example/audio.ogg"));
        assert_eq!(payload.text_message(), None);
    }

    #[test]
    fn blank_phone_counts_as_missing() {
        let payload = InboundPayload::from_json(&json!({ "phone": "  " }));
        assert_eq!(payload.phone(), None);
    }

    #[test]
    fn numeric_phone_is_read_as_text() {
        let payload = InboundPayload::from_json(&json!({ "phone": 5511999990000u64, "fromMe": true }));
        assert_eq!(payload.phone(), Some("5511999990000"));
        assert!(payload.is_operator_message());
    }

    #[test]
    fn mistyped_fields_count_as_absent() {
        let payload = InboundPayload::from_json(&json!({ "phone": "5511", "text": "Oi", "fromMe": "yes" }));
        assert_eq!(payload.text_message(), None);
        assert!(!payload.is_operator_message());

        assert_eq!(InboundPayload::from_json(&json!([1, 2])), InboundPayload::default());
    }

    #[test]
    fn chat_request_history_defaults_to_empty() {
        let request: ChatRequest = serde_json::from_value(json!({
            "telefone_usuario": "5511",
            "mensagem": "Oi"
        }))
        .unwrap();
        assert!(request.historico.is_empty());
    }
}
