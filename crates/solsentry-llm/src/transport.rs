//! HTTP transport for the completion service.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Longest response body excerpt carried in an error.
const BODY_EXCERPT_LEN: usize = 500;

/// Failures of the remote call itself, before the body is interpreted.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to reach completion service: {0}")]
    Connection(String),

    #[error("Completion service timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    #[error("Completion service returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// One completion call.
#[derive(Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub api_key: &'a str,
    pub model: &'a str,
    pub prompt: &'a str,
    pub temperature: f64,
}

impl fmt::Debug for CompletionRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionRequest")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("prompt_len", &self.prompt.len())
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// Sends a prompt and returns the raw body of a successful response.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, TransportError>;
}

/// Request body for the `generateContent` endpoint.
#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    response_mime_type: &'static str,
    temperature: f64,
}

/// Transport for the Gemini Generative Language API.
///
/// The credential travels in the `x-goog-api-key` header, so request URLs
/// (and any error that echoes them) never contain it.
#[derive(Debug, Clone)]
pub struct GeminiTransport {
    api_base_url: String,
    timeout_secs: u64,
    http_client: HttpClient,
}

impl GeminiTransport {
    pub fn new(api_base_url: impl Into<String>, timeout_secs: u64) -> Result<Self, TransportError> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        Ok(Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            timeout_secs,
            http_client,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.api_base_url, model)
    }
}

#[async_trait]
impl CompletionTransport for GeminiTransport {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, TransportError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: request.temperature,
            },
        };

        let url = self.endpoint(request.model);
        debug!("Sending request to completion service: {}", url);

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", request.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.map_reqwest_error(e))?;
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: excerpt(&text),
            });
        }

        Ok(text)
    }
}

impl GeminiTransport {
    fn map_reqwest_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            TransportError::Connection(e.to_string())
        }
    }
}

/// Leading part of a body, cut on a char boundary.
pub(crate) fn excerpt(body: &str) -> String {
    if body.chars().count() <= BODY_EXCERPT_LEN {
        return body.to_string();
    }
    let mut cut: String = body.chars().take(BODY_EXCERPT_LEN).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: "hello" }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: 0.2,
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "contents": [{"parts": [{"text": "hello"}]}],
                "generationConfig": {"response_mime_type": "application/json", "temperature": 0.2}
            })
        );
    }

    #[test]
    fn test_endpoint_never_carries_key() {
        let transport = GeminiTransport::new("https://example.test/v1beta/", 5).unwrap();
        let url = transport.endpoint("gemini-1.5-flash-latest");
        assert_eq!(
            url,
            "https://example.test/v1beta/models/gemini-1.5-flash-latest:generateContent"
        );
        assert!(!url.contains("key="));
    }

    #[test]
    fn test_request_debug_redacts_key() {
        let request = CompletionRequest {
            api_key: "secret-key",
            model: "m",
            prompt: "p",
            temperature: 0.2,
        };
        assert!(!format!("{request:?}").contains("secret-key"));
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("short"), "short");
        let long = "é".repeat(BODY_EXCERPT_LEN + 10);
        let cut = excerpt(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), BODY_EXCERPT_LEN + 3);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_connection_error() {
        let transport = GeminiTransport::new("http://127.0.0.1:1", 5).unwrap();
        let err = transport
            .complete(CompletionRequest {
                api_key: "secret-key",
                model: "m",
                prompt: "p",
                temperature: 0.2,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Connection(_)), "{err:?}");
        assert!(!err.to_string().contains("secret-key"));
    }
}
