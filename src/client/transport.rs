//! Wire format and transport for OpenAI-compatible chat completions.
//!
//! The [`Transport`] trait is the seam between retry logic and the network:
//! [`HttpTransport`] talks to a real endpoint through `reqwest`, tests plug in
//! scripted transports. A transport only reports what happened (status and
//! body, or a transport fault); classifying that outcome is the client's job.

use super::payload::RequestPayload;
use crate::config::ClientConfig;
use crate::error::TransportError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

// ── Request ──────────────────────────────────────────────────────────────

/// Chat-completion request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: Vec<ContentPart>,
}

/// One part of a multi-part user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

impl ChatRequest {
    /// A single user message: the payload text, then one image part per image.
    pub fn from_payload(payload: &RequestPayload, config: &ClientConfig) -> Self {
        let mut content = Vec::with_capacity(1 + payload.images.len());
        content.push(ContentPart::Text {
            text: payload.text.clone(),
        });
        content.extend(payload.images.iter().map(|image| ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: image.data_url(),
            },
        }));

        Self {
            model: config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────

/// The subset of a chat-completion response the client reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ResponseMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatResponse {
    /// The first choice's non-blank message content.
    pub fn answer(&self) -> Option<&str> {
        self.choices
            .first()?
            .message
            .as_ref()?
            .content
            .as_deref()
            .filter(|c| !c.trim().is_empty())
    }
}

/// Raw HTTP outcome: status code and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

// ── Transport ────────────────────────────────────────────────────────────

/// Sends one request, once. No retries.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn dispatch(&self, request: &ChatRequest) -> Result<TransportResponse, TransportError>;
}

/// `reqwest`-backed transport for `POST {base_url}/chat/completions`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(classify_reqwest_error)?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn dispatch(&self, request: &ChatRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = self.http.post(&self.endpoint).json(request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(classify_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify_reqwest_error)?;
        debug!("POST {} → {} ({} bytes)", self.endpoint, status, body.len());

        Ok(TransportResponse { status, body })
    }
}

/// Map a `reqwest` error onto the transport taxonomy.
fn classify_reqwest_error(e: reqwest::Error) -> TransportError {
    let detail = error_chain(&e);
    if e.is_timeout() {
        TransportError::Timeout(detail)
    } else if looks_like_tls(&detail) {
        TransportError::Tls(detail)
    } else if e.is_connect() {
        TransportError::Connection(detail)
    } else {
        TransportError::Protocol(detail)
    }
}

/// `reqwest` hides the interesting part of an error in its source chain.
fn error_chain(e: &dyn std::error::Error) -> String {
    let mut msg = e.to_string();
    let mut source = e.source();
    while let Some(inner) = source {
        msg.push_str(": ");
        msg.push_str(&inner.to_string());
        source = inner.source();
    }
    msg
}

fn looks_like_tls(detail: &str) -> bool {
    let lower = detail.to_lowercase();
    lower.contains("tls") || lower.contains("certificate") || lower.contains("handshake")
}
