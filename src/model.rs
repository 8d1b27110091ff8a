//! Model-inference client.
//!
//! [`ModelClient`] is the only seam between this crate and a language model.
//! Callers construct a client once and pass it to whatever needs it; tests
//! substitute their own implementation.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo-16k";
const DEFAULT_TIMEOUT_SECS: u64 = 300;
const ERROR_BODY_PREVIEW: usize = 512;

/// Sends a system prompt and a user prompt, returns one completion.
pub trait ModelClient {
    /// Requests a single completion.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Model`] if the request fails or the response has no
    /// completion text.
    fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// Settings for an OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// API base URL; `/chat/completions` is appended
    pub base_url: String,

    /// Model name sent with each request
    pub model: String,

    /// Bearer token; optional for locally hosted servers
    pub api_key: Option<String>,

    /// Whole-request timeout
    pub timeout: Duration,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ModelConfig {
    /// Validates the settings.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty base URL or model name.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::config("model base URL must not be empty"));
        }

        if self.model.trim().is_empty() {
            return Err(Error::config("model name must not be empty"));
        }

        if self.timeout.is_zero() {
            return Err(Error::config("model timeout must be greater than 0"));
        }

        Ok(())
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Blocking client for OpenAI-compatible chat-completions APIs.
pub struct OpenAiClient {
    client: reqwest::blocking::Client,
    config: ModelConfig,
    endpoint: String,
}

impl OpenAiClient {
    /// Creates a client from settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: ModelConfig) -> Result<Self> {
        config.validate()?;

        if config.api_key.is_none() && config.base_url.contains("api.openai.com") {
            warn!("No API key configured for {}", config.base_url);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint(),
            config,
        })
    }

    /// Model name used for requests.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }
}

impl ModelClient for OpenAiClient {
    #[instrument(skip_all, fields(model = %self.config.model))]
    fn complete(&self, system: &str, user: &str) -> Result<String> {
        let body = request_body(&self.config.model, system, user);

        debug!(
            "POST {} ({} system chars, {} user chars)",
            self.endpoint,
            system.len(),
            user.len()
        );

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send()?;
        let status = response.status();
        let text = response.text()?;

        if !status.is_success() {
            return Err(Error::model(format!(
                "{} returned {}: {}",
                self.endpoint,
                status,
                preview(&text)
            )));
        }

        parse_completion(&text)
    }
}

fn request_body<'a>(model: &'a str, system: &'a str, user: &'a str) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: [
            ChatMessage {
                role: "system",
                content: system,
            },
            ChatMessage {
                role: "user",
                content: user,
            },
        ],
    }
}

/// Extracts `choices[0].message.content` from a response body.
fn parse_completion(body: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| Error::model(format!("malformed response ({e}): {}", preview(body))))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| Error::model("response contained no completion text"))
}

fn preview(text: &str) -> &str {
    if text.len() <= ERROR_BODY_PREVIEW {
        return text;
    }

    let mut end = ERROR_BODY_PREVIEW;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
