//! Receipt recognition client
//!
//! Posts a receipt photo to the generative-model proxy and parses the
//! JSON array of line candidates out of the model's reply.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::config::ReceiptsConfig;
use crate::error::{AppError, AppResult};
use crate::services::{ReceiptImage, ReceiptRecognizer};

const RECEIPT_PROMPT: &str = "Ти - експерт з розпізнавання чеків з магазину METRO. \
Проаналізуй це фото чека і витягни ВСІ товари.\n\n\
Для КОЖНОГО товару вкажи назву українською, кількість (число), одиницю виміру \
(kg, piece, pack, box, bunch, other) та ціну за одиницю в гривнях.\n\
Грами переведи в кілограми. Якщо вказана лише загальна сума, розрахуй ціну за одиницю. \
Ігноруй підсумки, знижки та загальні суми.\n\n\
Формат відповіді:\n\
[{\"productName\": \"Назва товару\", \"quantity\": 1.5, \"unit\": \"kg\", \"pricePerUnit\": 45.50}]\n\n\
Відповідай ТІЛЬКИ JSON масивом, без додаткових пояснень.";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 2],
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    Image { inline_data: InlineData<'a> },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

/// Client for the receipt recognition proxy
#[derive(Clone)]
pub struct ReceiptRecognitionClient {
    endpoint: String,
    http_client: Client,
}

impl ReceiptRecognitionClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            http_client,
        })
    }

    pub fn from_config(config: &ReceiptsConfig) -> AppResult<Self> {
        Self::new(&config.endpoint, Duration::from_secs(config.timeout_secs))
    }
}

/// Drop a `data:...;base64,` prefix and check the payload decodes
pub fn image_payload(data: &str) -> AppResult<&str> {
    let payload = match data.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    let payload = payload.trim();
    match STANDARD.decode(payload) {
        Ok(bytes) if !bytes.is_empty() => Ok(payload),
        Ok(_) => Err(AppError::Validation {
            field: "dataBase64".to_string(),
            message: "Image is empty".to_string(),
        }),
        Err(e) => Err(AppError::Validation {
            field: "dataBase64".to_string(),
            message: format!("Image is not valid base64: {}", e),
        }),
    }
}

/// Text of the first candidate part
pub fn extract_text(response: &Value) -> Option<&str> {
    response
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
}

/// Remove a surrounding markdown code fence, with or without a `json` tag
pub fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Parse the model's reply into raw candidates
pub fn parse_candidates(text: &str) -> AppResult<Vec<Value>> {
    match serde_json::from_str::<Value>(strip_code_fence(text)) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(_) => Err(AppError::ReceiptRecognition(
            "Response is not an array".to_string(),
        )),
        Err(e) => {
            tracing::debug!("Unparseable recognition reply: {}", text);
            Err(AppError::ReceiptRecognition(format!(
                "Could not parse response structure: {}",
                e
            )))
        }
    }
}

#[async_trait]
impl ReceiptRecognizer for ReceiptRecognitionClient {
    async fn recognize(&self, image: &ReceiptImage) -> AppResult<Vec<Value>> {
        let data = image_payload(&image.data_base64)?;
        let request = GenerateRequest {
            contents: [Content {
                parts: [
                    Part::Text {
                        text: RECEIPT_PROMPT,
                    },
                    Part::Image {
                        inline_data: InlineData {
                            mime_type: &image.mime_type,
                            data,
                        },
                    },
                ],
            }],
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::ReceiptRecognition(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ReceiptRecognition(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let result: Value = response.json().await.map_err(|e| {
            AppError::ReceiptRecognition(format!("Failed to parse response: {}", e))
        })?;

        let text = extract_text(&result)
            .ok_or_else(|| AppError::ReceiptRecognition("Model returned no text".to_string()))?;

        parse_candidates(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("```\n[2]\n```"), "[2]");
        assert_eq!(strip_code_fence("  [3] "), "[3]");
    }

    #[test]
    fn test_extract_text() {
        let response = json!({
            "candidates": [{ "content": { "parts": [{ "text": "[]" }] } }]
        });
        assert_eq!(extract_text(&response), Some("[]"));
        assert_eq!(extract_text(&json!({ "candidates": [] })), None);
    }

    #[test]
    fn test_parse_candidates() {
        let text = "```json\n[{\"productName\": \"Сир\", \"quantity\": 1}]\n```";
        let items = parse_candidates(text).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["productName"], "Сир");

        assert!(matches!(
            parse_candidates("{\"productName\": \"Сир\"}"),
            Err(AppError::ReceiptRecognition(_))
        ));
        assert!(parse_candidates("not json").is_err());
    }

    #[test]
    fn test_image_payload_strips_data_url() {
        assert_eq!(image_payload("data:image/png;base64,aGVsbG8=").unwrap(), "aGVsbG8=");
        assert_eq!(image_payload("aGVsbG8=").unwrap(), "aGVsbG8=");
        assert!(image_payload("***").is_err());
        assert!(image_payload("").is_err());
    }

    #[test]
    fn test_request_shape() {
        let request = GenerateRequest {
            contents: [Content {
                parts: [
                    Part::Text { text: "prompt" },
                    Part::Image {
                        inline_data: InlineData {
                            mime_type: "image/jpeg",
                            data: "aGVsbG8=",
                        },
                    },
                ],
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "prompt");
        assert_eq!(json["contents"][0]["parts"][1]["inline_data"]["mime_type"], "image/jpeg");
    }
}
