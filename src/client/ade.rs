//! Landing AI ADE parse client.

use crate::client::{ExtractionService, ScopedDocument};
use crate::core::config::{ApiKey, ExtractionConfig};
use crate::core::errors::{ExtractionError, FindocError};
use crate::domain::ParseResponse;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use std::time::Instant;
use tracing::{error, info};

/// Longest service error message carried into [`ExtractionError::Service`].
const MAX_ERROR_MESSAGE_CHARS: usize = 500;

/// Client for the ADE parse endpoint.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct AdeClient {
    http: reqwest::Client,
    config: ExtractionConfig,
}

impl AdeClient {
    /// Creates a client from explicit configuration.
    pub fn new(config: ExtractionConfig) -> Result<Self, FindocError> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("findoc/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ExtractionError::Request)?;

        Ok(Self { http, config })
    }

    /// Same client, different credential.
    pub fn with_api_key(&self, api_key: ApiKey) -> Self {
        Self {
            http: self.http.clone(),
            config: ExtractionConfig {
                api_key,
                ..self.config.clone()
            },
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    async fn send(&self, staged: &ScopedDocument) -> Result<ParseResponse, ExtractionError> {
        let bytes = staged.read().await.map_err(ExtractionError::Staging)?;
        let document = Part::bytes(bytes).file_name(staged.filename().to_string());
        let form = Form::new()
            .part("document", document)
            .text("model", self.config.model.clone());

        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(self.config.api_key.expose())
            .multipart(form)
            .send()
            .await
            .map_err(ExtractionError::Request)?;

        let status = response.status();
        let body = response.bytes().await.map_err(ExtractionError::Request)?;

        if !status.is_success() {
            return Err(ExtractionError::Service {
                status: status.as_u16(),
                message: service_message(status, &body),
            });
        }

        ParseResponse::from_slice(&body).map_err(ExtractionError::Decode)
    }
}

impl ExtractionService for AdeClient {
    async fn parse(&self, document: &[u8], filename: &str) -> Result<ParseResponse, ExtractionError> {
        let staged = ScopedDocument::create(document, filename)
            .await
            .map_err(ExtractionError::Staging)?;

        info!(
            filename,
            bytes = document.len(),
            model = %self.config.model,
            "Sending document to extraction service"
        );
        let start = Instant::now();

        let result = self.send(&staged).await;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        match &result {
            Ok(response) => info!(
                filename,
                chunks = response.chunks.len(),
                grounded = response.grounded_chunk_count(),
                elapsed_ms,
                "Extraction completed"
            ),
            Err(e) => error!(filename, error = %e, elapsed_ms, "Extraction failed"),
        }

        result
    }
}

/// Human-readable message from an error response body.
///
/// Prefers a `message`, `detail` or `error` string field of a JSON body, then
/// the raw body, then the canonical reason phrase.
fn service_message(status: StatusCode, body: &[u8]) -> String {
    let from_json = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "detail", "error"]
                .iter()
                .find_map(|key| value.get(key).and_then(|v| v.as_str()).map(str::to_string))
        });

    let message = from_json.unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string());

    if message.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string();
    }

    if message.chars().count() > MAX_ERROR_MESSAGE_CHARS {
        let truncated: String = message.chars().take(MAX_ERROR_MESSAGE_CHARS).collect();
        format!("{truncated}...")
    } else {
        message
    }
}
