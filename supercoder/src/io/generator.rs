//! Generator adapter for the external code-generation service.
//!
//! The [`Generator`] trait decouples phase orchestration from the actual
//! service backend (currently an OpenAI-style chat completions endpoint).
//! Tests use scripted generators that return predetermined responses without
//! network access. The adapter is constructed once and passed explicitly
//! into every phase that needs it.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::GeneratorConfig;

/// Parameters for one generation call.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Fixed role instruction sent with every call.
    pub system_instruction: String,
    /// Rendered prompt for this phase.
    pub prompt: String,
}

/// Abstraction over generation service backends.
pub trait Generator {
    /// One synchronous call per phase invocation, no streaming. Service
    /// faults surface as `Err`; callers fold them into the next prompt
    /// rather than letting them escape the state machine.
    fn generate(&self, request: &GenerateRequest) -> Result<String>;
}

/// Generator backed by an OpenAI-style `/chat/completions` endpoint.
pub struct OpenAiGenerator {
    client: reqwest::blocking::Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl OpenAiGenerator {
    /// Build a client from config. The API key is read from the configured
    /// environment variable; the request timeout bounds the otherwise
    /// unbounded network wait.
    pub fn from_config(cfg: &GeneratorConfig) -> Result<Self> {
        let api_key = std::env::var(&cfg.api_key_env)
            .with_context(|| format!("read API key from ${}", cfg.api_key_env))?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            api_key,
        })
    }
}

impl Generator for OpenAiGenerator {
    #[instrument(skip_all, fields(model = %self.model))]
    fn generate(&self, request: &GenerateRequest) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_instruction,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!(url = %url, prompt_bytes = request.prompt.len(), "sending generation request");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .context("send generation request")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            warn!(status = %status, "generation request failed");
            return Err(anyhow!("generation service returned {status}: {detail}"));
        }

        let parsed: ChatResponse = response.json().context("parse generation response")?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(anyhow!("generation service returned an empty response"));
        }
        debug!(response_bytes = content.len(), "generation response received");
        Ok(content)
    }
}
