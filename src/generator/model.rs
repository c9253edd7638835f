//! Language model capability and its OpenAI-compatible HTTP implementation.

use crate::config::GeneratorConfig;
use crate::error::{GenerationError, GenerationResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Turns a prompt into a completion.
pub trait LanguageModel: Send + Sync {
    fn complete(&self, prompt: &str) -> GenerationResult<String>;

    /// Identifier used in log messages.
    fn name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
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
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Client for a `/chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiChatModel {
    http: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl std::fmt::Debug for OpenAiChatModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiChatModel")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl OpenAiChatModel {
    /// Create a client, reading the API key from the environment variable
    /// named by `config.api_key_env`.
    pub fn from_config(config: &GeneratorConfig) -> GenerationResult<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| GenerationError::MissingApiKey {
                var: config.api_key_env.clone(),
            })?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &GeneratorConfig, api_key: String) -> GenerationResult<Self> {
        if config.base_url.trim().is_empty() {
            return Err(GenerationError::Config {
                reason: "generator.base_url is empty".to_string(),
            });
        }
        if !(0.0..=2.0).contains(&config.temperature) {
            return Err(GenerationError::Config {
                reason: format!(
                    "generator.temperature must be between 0 and 2, got {}",
                    config.temperature
                ),
            });
        }

        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

impl LanguageModel for OpenAiChatModel {
    fn complete(&self, prompt: &str) -> GenerationResult<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        debug!("POST {} ({} prompt bytes)", self.endpoint, prompt.len());
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(GenerationError::Api { status, body });
        }

        first_choice(resp.json()?)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

fn first_choice(response: ChatResponse) -> GenerationResult<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or(GenerationError::EmptyResponse)
}
