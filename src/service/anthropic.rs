//! Minimal blocking client for the Anthropic Messages API.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::AnthropicConfig;
use crate::error::ServiceError;

const API_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// One-shot, non-streaming completions with a per-request timeout.
pub struct AnthropicClient {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl AnthropicClient {
    /// Fails with [`ServiceError::MissingCredential`] when no key is configured.
    pub fn new(config: &AnthropicConfig, timeout: Duration) -> Result<Self, ServiceError> {
        let api_key = config
            .credential()
            .ok_or(ServiceError::MissingCredential)?
            .to_string();
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
        })
    }

    /// Send a single user message and return the concatenated text blocks.
    pub fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, ServiceError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: MessagesResponse = response.json()?;
        let text: String = parsed
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text)
            .collect();
        if text.trim().is_empty() {
            return Err(ServiceError::Malformed("response has no text".to_string()));
        }
        Ok(text)
    }
}

/// The outermost `{ ... }` span of `text`, tolerating prose or code fences
/// around a JSON answer.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}
