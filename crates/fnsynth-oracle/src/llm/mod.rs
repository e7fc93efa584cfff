//! LLM-backed oracle via Anthropic, OpenAI, OpenAI-compatible, Ollama, or local APIs.

mod ollama;
mod providers;

pub use providers::LlmProvider;

use crate::reply::strip_think_blocks;
use crate::{CodeOracle, OracleError};
use async_trait::async_trait;
use fnsynth_core::config::LlmConfig;
use providers::{AnthropicRequest, AnthropicResponse, Message, OpenAIRequest, OpenAIResponse};
use std::time::Duration;

/// A simple LLM client for making completion requests.
pub struct LlmClient {
    provider: LlmProvider,
    http: reqwest::Client,
    max_tokens: u32,
}

impl LlmClient {
    pub fn new(provider: LlmProvider, config: &LlmConfig) -> Result<Self, OracleError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| OracleError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            provider,
            http,
            max_tokens: config.max_tokens,
        })
    }

    /// Create with full provider resolution including Ollama auto-detection.
    pub async fn from_config(config: &LlmConfig) -> Result<Self, OracleError> {
        let provider = LlmProvider::resolve(config).await?;
        Self::new(provider, config)
    }

    /// Human-readable provider name.
    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    /// Model name in use.
    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Send a completion request and return the response text.
    pub async fn complete(&self, system: &str, user_prompt: &str) -> Result<String, OracleError> {
        let text = match &self.provider {
            LlmProvider::Anthropic { api_key, model } => {
                let req = AnthropicRequest {
                    model: model.clone(),
                    max_tokens: self.max_tokens,
                    system: system.to_string(),
                    messages: vec![Message::new("user", user_prompt)],
                };

                let resp = self
                    .http
                    .post("https://api.anthropic.com/v1/messages")
                    .header("x-api-key", api_key)
                    .header("anthropic-version", "2023-06-01")
                    .header("content-type", "application/json")
                    .json(&req)
                    .send()
                    .await
                    .map_err(|e| transport_error("Anthropic", &e))?;
                let resp = check_status(resp, "Anthropic", model).await?;

                let body = resp
                    .json::<AnthropicResponse>()
                    .await
                    .map_err(|e| OracleError::Provider(format!("bad Anthropic response: {e}")))?;
                body.content.into_iter().next().map(|c| c.text)
            }
            LlmProvider::OpenAI { api_key, model } => {
                let req = chat_request(model, self.max_tokens, system, user_prompt, None);
                let resp = self
                    .http
                    .post("https://api.openai.com/v1/chat/completions")
                    .header("Authorization", format!("Bearer {}", api_key))
                    .header("content-type", "application/json")
                    .json(&req)
                    .send()
                    .await
                    .map_err(|e| transport_error("OpenAI", &e))?;
                let resp = check_status(resp, "OpenAI", model).await?;
                first_choice(resp, "OpenAI").await?
            }
            LlmProvider::OpenAICompatible {
                api_key,
                base_url,
                model,
            } => {
                let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
                let req = chat_request(model, self.max_tokens, system, user_prompt, None);
                let resp = self
                    .http
                    .post(&url)
                    .header("Authorization", format!("Bearer {}", api_key))
                    .header("content-type", "application/json")
                    .json(&req)
                    .send()
                    .await
                    .map_err(|e| transport_error(&url, &e))?;
                let resp = check_status(resp, "OpenAI-compatible API", model).await?;
                first_choice(resp, "OpenAI-compatible API").await?
            }
            LlmProvider::Ollama { base_url, model } | LlmProvider::Local { base_url, model } => {
                let label = self.provider.provider_name();
                let url = format!("{}/v1/chat/completions", base_url.trim_end_matches('/'));

                // /no_think disables thinking mode on models that support it (e.g. qwen3)
                let user_content = format!("{} /no_think", user_prompt);
                let req = chat_request(model, self.max_tokens, system, &user_content, Some(0.0));

                let resp = self
                    .http
                    .post(&url)
                    .header("content-type", "application/json")
                    .json(&req)
                    .send()
                    .await
                    .map_err(|e| transport_error(&url, &e))?;
                let resp = check_status(resp, label, model).await?;
                first_choice(resp, label).await?
            }
        };

        let text = text.ok_or_else(|| {
            OracleError::Provider(format!("empty response from {}", self.provider_name()))
        })?;
        Ok(strip_think_blocks(&text))
    }
}

#[async_trait]
impl CodeOracle for LlmClient {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, OracleError> {
        tracing::debug!(
            provider = self.provider_name(),
            model = self.model_name(),
            prompt_len = prompt.len(),
            "oracle request"
        );
        self.complete(system, prompt).await
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.provider_name(), self.model_name())
    }
}

fn chat_request(
    model: &str,
    max_tokens: u32,
    system: &str,
    user: &str,
    temperature: Option<f64>,
) -> OpenAIRequest {
    OpenAIRequest {
        model: model.to_string(),
        max_tokens,
        messages: vec![Message::new("system", system), Message::new("user", user)],
        temperature,
    }
}

/// Map a reqwest send failure: connection problems mean the service is unreachable.
fn transport_error(target: &str, e: &reqwest::Error) -> OracleError {
    if e.is_connect() || e.is_timeout() {
        OracleError::Unavailable(format!("{target}: {e}"))
    } else {
        OracleError::Provider(format!("{target}: {e}"))
    }
}

async fn check_status(
    resp: reqwest::Response,
    label: &str,
    model: &str,
) -> Result<reqwest::Response, OracleError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    Err(classify_status(status.as_u16(), &text, label, model))
}

/// Translate a non-success HTTP status into an oracle error.
fn classify_status(status: u16, body: &str, label: &str, model: &str) -> OracleError {
    let lower = body.to_lowercase();
    if status == 404 && lower.contains("model") {
        return OracleError::NoModelLoaded(model.to_string());
    }
    if status == 503 || status == 502 {
        return OracleError::Unavailable(format!("{label} returned {status}"));
    }
    OracleError::Provider(format!("{label} returned {status}: {body}"))
}

async fn first_choice(resp: reqwest::Response, label: &str) -> Result<Option<String>, OracleError> {
    let body = resp
        .json::<OpenAIResponse>()
        .await
        .map_err(|e| OracleError::Provider(format!("bad {label} response: {e}")))?;
    Ok(body.choices.into_iter().next().map(|c| c.message.content))
}
