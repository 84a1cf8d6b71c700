use std::io::{self, Write as _};
use std::time::Duration;

use reqwest::{header, Client};
use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use tracing::{debug, error, info, warn};

use shared_config::AppConfig;
use shared_models::ClinicError;

use crate::models::OutboundMessage;

const SEND_TIMEOUT: Duration = Duration::from_secs(30);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Z-API gateway: outbound text messages and inbound media downloads.
pub struct ZapiClient {
    http_client: Client,
    base_url: String,
    instance_id: String,
    token: String,
    client_token: String,
}

impl ZapiClient {
    pub fn new(config: &AppConfig) -> Self {
        let http_client = Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            http_client,
            base_url: config.zapi_base_url.trim_end_matches('/').to_string(),
            instance_id: config.zapi_instance_id.clone(),
            token: config.zapi_token.clone(),
            client_token: config.zapi_client_token.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.instance_id.is_empty() && !self.token.is_empty() && !self.client_token.is_empty()
    }

    fn send_text_url(&self) -> String {
        format!(
            "{}/instances/{}/token/{}/send-text",
            self.base_url, self.instance_id, self.token
        )
    }

    /// Sends `message` to `phone`. Missing credentials skip the send.
    pub async fn send_text(&self, phone: &str, message: &str) -> Result<(), ClinicError> {
        if !self.is_configured() {
            warn!("Z-API credentials missing, reply to {} was not sent", phone);
            return Ok(());
        }

        let body = to_ascii_json(&OutboundMessage { phone, message })
            .map_err(|e| ClinicError::Upstream(format!("Could not encode outbound message: {}", e)))?;

        debug!("Sending WhatsApp reply to {}", phone);

        let response = self
            .http_client
            .post(self.send_text_url())
            .header("Client-Token", &self.client_token)
            .header(header::CONTENT_TYPE, "application/json; charset=utf-8")
            .body(body)
            .send()
            .await
            .map_err(|e| ClinicError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ClinicError::Upstream(format!("Z-API error ({}): {}", status, error_text)));
        }

        info!("Reply delivered to {}", phone);
        Ok(())
    }

    /// Fetches a media file announced by the gateway. Failures yield `None`.
    pub async fn download_audio(&self, url: &str) -> Option<Vec<u8>> {
        let mut request = self.http_client.get(url).timeout(DOWNLOAD_TIMEOUT);
        if !self.client_token.is_empty() {
            request = request.header("Client-Token", &self.client_token);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Audio download failed for {}: {}", url, e);
                return None;
            }
        };

        if !response.status().is_success() {
            error!("Audio download returned {} for {}", response.status(), url);
            return None;
        }

        match response.bytes().await {
            Ok(bytes) if !bytes.is_empty() => Some(bytes.to_vec()),
            Ok(_) => {
                warn!("Audio download for {} was empty", url);
                None
            }
            Err(e) => {
                error!("Could not read audio body from {}: {}", url, e);
                None
            }
        }
    }
}

/// JSON formatter that escapes every non-ASCII character in strings as
/// `\uXXXX` (UTF-16 units, surrogate pairs above the BMP).
struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut units = [0u16; 2];
        let mut ascii_from = 0;

        for (index, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[ascii_from..index])?;
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            ascii_from = index + ch.len_utf8();
        }

        writer.write_all(&fragment.as_bytes()[ascii_from..])
    }
}

/// Serializes `value` as pure-ASCII JSON.
pub fn to_ascii_json<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut body = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut body, AsciiFormatter);
    value.serialize(&mut serializer)?;
    Ok(body)
}
