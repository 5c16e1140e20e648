//! Workflow webhook client
//!
//! Receives submitted draft batches and directly saved items.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use shared::{BatchPayload, LineItem};
use std::time::Duration;

use crate::config::WebhookConfig;
use crate::error::{AppError, AppResult};
use crate::services::SubmissionEndpoint;

/// Client for the workflow webhook
#[derive(Clone)]
pub struct WebhookClient {
    url: String,
    http_client: Client,
}

impl WebhookClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            http_client,
        })
    }

    /// Client for the URL of the configured mode
    pub fn from_config(config: &WebhookConfig) -> AppResult<Self> {
        Self::new(config.url(), config.timeout())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post<T: serde::Serialize + ?Sized>(&self, body: &T) -> AppResult<Value> {
        let response = self
            .http_client
            .post(&self.url)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::SubmissionFailed(format!("Request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::SubmissionFailed(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(AppError::SubmissionFailed(format!("HTTP {}: {}", status, text)));
        }

        Ok(parse_response_body(&text))
    }
}

/// Webhook replies are usually JSON but may be empty or plain text
pub fn parse_response_body(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

#[async_trait]
impl SubmissionEndpoint for WebhookClient {
    async fn send_batch(&self, payload: &BatchPayload) -> AppResult<Value> {
        tracing::debug!(
            "Sending {} batch for {:?} to webhook",
            payload.batch_type,
            payload.key()
        );
        self.post(payload).await
    }

    async fn send_item(&self, item: &LineItem) -> AppResult<Value> {
        tracing::debug!("Sending {} item {} to webhook", item.item_type, item.id);
        self.post(item).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_body_parsing() {
        assert_eq!(parse_response_body(""), Value::Null);
        assert_eq!(parse_response_body(" {\"ok\":true} "), json!({ "ok": true }));
        assert_eq!(
            parse_response_body("Workflow was started"),
            Value::String("Workflow was started".to_string())
        );
    }

    #[test]
    fn test_client_keeps_url() {
        let client = WebhookClient::new("http://localhost:5678/webhook", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url(), "http://localhost:5678/webhook");
    }
}
