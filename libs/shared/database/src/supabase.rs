use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("API error ({status}): {body}")]
    Api { status: StatusCode, body: String },

    #[error("Row serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid header value for {0}")]
    InvalidHeader(&'static str),

    #[error("Insert returned no representation for {0}")]
    EmptyRepresentation(String),
}

/// PostgREST access to the clinic database.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            service_key: config.supabase_service_key.clone(),
        }
    }

    fn get_headers(&self) -> Result<HeaderMap, DatabaseError> {
        let mut headers = HeaderMap::new();

        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.service_key).map_err(|_| DatabaseError::InvalidHeader("apikey"))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.service_key))
                .map_err(|_| DatabaseError::InvalidHeader("authorization"))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(headers)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<reqwest::Response, DatabaseError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers()?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Database API error ({}): {}", status, error_text);

            return Err(match status {
                StatusCode::CONFLICT => DatabaseError::Conflict(error_text),
                _ => DatabaseError::Api { status, body: error_text },
            });
        }

        Ok(response)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, DatabaseError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, DatabaseError>
    where
        T: DeserializeOwned,
    {
        let response = self.send(method, path, body, extra_headers).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Runs a filtered `GET` and decodes every returned row.
    pub async fn select<T>(&self, path: &str) -> Result<Vec<T>, DatabaseError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::GET, path, None).await
    }

    /// Inserts one row and returns its stored representation.
    pub async fn insert<T>(&self, table: &str, row: Value) -> Result<T, DatabaseError>
    where
        T: DeserializeOwned,
    {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let rows: Vec<T> = self
            .request_with_headers(Method::POST, &format!("/rest/v1/{}", table), Some(row), Some(headers))
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| DatabaseError::EmptyRepresentation(table.to_string()))
    }

    /// Insert-or-update keyed on `on_conflict`. Only the columns present in
    /// `row` are overwritten on an existing record.
    pub async fn upsert(&self, table: &str, on_conflict: &str, row: Value) -> Result<(), DatabaseError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Prefer",
            HeaderValue::from_static("resolution=merge-duplicates,return=minimal"),
        );

        let path = format!("/rest/v1/{}?on_conflict={}", table, on_conflict);
        self.send(Method::POST, &path, Some(row), Some(headers)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> SupabaseClient {
        SupabaseClient {
            client: Client::new(),
            base_url: server.uri(),
            service_key: "service-key".to_string(),
        }
    }

    #[tokio::test]
    async fn select_sends_service_key_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/patients"))
            .and(header("apikey", "service-key"))
            .and(header("authorization", "Bearer service-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }])))
            .expect(1)
            .mount(&server)
            .await;

        let rows: Vec<Value> = client_for(&server).select("/rest/v1/patients?id=eq.1").await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn conflict_status_is_reported_as_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/patients"))
            .respond_with(ResponseTemplate::new(409).set_body_string("duplicate key value"))
            .mount(&server)
            .await;

        let result: Result<Value, _> = client_for(&server).insert("patients", json!({})).await;
        assert_matches!(result, Err(DatabaseError::Conflict(_)));
    }

    #[tokio::test]
    async fn upsert_tolerates_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/conversations"))
            .and(query_param("on_conflict", "phone"))
            .and(header_exists("prefer"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .upsert("conversations", "phone", json!({ "phone": "5511" }))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn empty_insert_representation_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/appointments"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
            .mount(&server)
            .await;

        let result: Result<Value, _> = client_for(&server).insert("appointments", json!({})).await;
        assert_matches!(result, Err(DatabaseError::EmptyRepresentation(_)));
    }
}
