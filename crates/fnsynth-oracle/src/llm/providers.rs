//! LLM provider resolution and API request/response types.

use super::ollama::{detect_ollama, model_is_available};
use crate::OracleError;
use fnsynth_core::config::LlmConfig;
use serde::{Deserialize, Serialize};

const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// LLM provider configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmProvider {
    Anthropic {
        api_key: String,
        model: String,
    },
    OpenAI {
        api_key: String,
        model: String,
    },
    /// Any OpenAI-compatible API with Bearer token auth (Together, OpenRouter, vLLM, etc.)
    OpenAICompatible {
        api_key: String,
        base_url: String,
        model: String,
    },
    Ollama {
        base_url: String,
        model: String,
    },
    Local {
        base_url: String,
        model: String,
    },
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

impl LlmProvider {
    /// Full async provider resolution with Ollama auto-detection.
    ///
    /// Priority chain:
    /// 1. `config.provider` forced -> use that provider
    /// 2. `ANTHROPIC_API_KEY` -> Anthropic
    /// 3. `OPENAI_API_KEY` -> OpenAI
    /// 4. `FNSYNTH_API_KEY` + `FNSYNTH_BASE_URL` -> OpenAI-compatible
    /// 5. Ollama on `config.local_url` -> auto-detected
    /// 6. `FNSYNTH_LOCAL_URL` env var -> any OpenAI-compatible server
    /// 7. Error with helpful message
    pub async fn resolve(config: &LlmConfig) -> Result<Self, OracleError> {
        if let Some(forced) = config.provider.as_deref() {
            return Self::from_forced_provider(forced, config, env_var);
        }

        if let Some(provider) = Self::from_cloud_keys(env_var) {
            return Ok(provider);
        }

        let base_url = &config.local_url;
        if let Some(installed) = detect_ollama(base_url).await {
            let model = env_var("FNSYNTH_MODEL").unwrap_or_else(|| config.local_model.clone());
            if model_is_available(&installed, &model) {
                tracing::info!(model = %model, "ollama detected");
                return Ok(Self::Ollama {
                    base_url: base_url.clone(),
                    model,
                });
            }
            return Err(OracleError::NoModelLoaded(model));
        }

        if let Some(url) = env_var("FNSYNTH_LOCAL_URL") {
            let model = env_var("FNSYNTH_MODEL").unwrap_or_else(|| config.local_model.clone());
            tracing::info!(url = %url, model = %model, "using local LLM server");
            return Ok(Self::Local {
                base_url: url,
                model,
            });
        }

        Err(OracleError::Config(
            "no LLM provider available. Options:\n\
             - Set ANTHROPIC_API_KEY or OPENAI_API_KEY\n\
             - Set FNSYNTH_API_KEY and FNSYNTH_BASE_URL for an OpenAI-compatible API\n\
             - Install Ollama (https://ollama.com) for local inference\n\
             - Set FNSYNTH_LOCAL_URL for any OpenAI-compatible server (LM Studio, vLLM, etc.)"
                .to_string(),
        ))
    }

    /// Resolve from API keys only; never touches the network.
    pub(crate) fn from_cloud_keys(env: impl Fn(&str) -> Option<String>) -> Option<Self> {
        if let Some(key) = env("ANTHROPIC_API_KEY") {
            return Some(Self::Anthropic {
                api_key: key,
                model: env("FNSYNTH_MODEL").unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string()),
            });
        }
        if let Some(key) = env("OPENAI_API_KEY") {
            return Some(Self::OpenAI {
                api_key: key,
                model: env("FNSYNTH_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            });
        }
        if let (Some(key), Some(base_url)) = (env("FNSYNTH_API_KEY"), env("FNSYNTH_BASE_URL")) {
            let model = env("FNSYNTH_MODEL")?;
            return Some(Self::OpenAICompatible {
                api_key: key,
                base_url,
                model,
            });
        }
        None
    }

    /// Resolve a forced provider name to a provider instance.
    pub(crate) fn from_forced_provider(
        provider: &str,
        config: &LlmConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, OracleError> {
        let missing =
            |var: &str| OracleError::Config(format!("FNSYNTH_PROVIDER={provider} but {var} not set"));
        match provider {
            "anthropic" => Ok(Self::Anthropic {
                api_key: env("ANTHROPIC_API_KEY").ok_or_else(|| missing("ANTHROPIC_API_KEY"))?,
                model: env("FNSYNTH_MODEL").unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string()),
            }),
            "openai" => Ok(Self::OpenAI {
                api_key: env("OPENAI_API_KEY").ok_or_else(|| missing("OPENAI_API_KEY"))?,
                model: env("FNSYNTH_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            }),
            "openai-compatible" => Ok(Self::OpenAICompatible {
                api_key: env("FNSYNTH_API_KEY").ok_or_else(|| missing("FNSYNTH_API_KEY"))?,
                base_url: env("FNSYNTH_BASE_URL").unwrap_or_else(|| config.local_url.clone()),
                model: env("FNSYNTH_MODEL").unwrap_or_else(|| config.local_model.clone()),
            }),
            "ollama" => Ok(Self::Ollama {
                base_url: config.local_url.clone(),
                model: env("FNSYNTH_MODEL").unwrap_or_else(|| config.local_model.clone()),
            }),
            "local" => Ok(Self::Local {
                base_url: env("FNSYNTH_LOCAL_URL").unwrap_or_else(|| config.local_url.clone()),
                model: env("FNSYNTH_MODEL").unwrap_or_else(|| config.local_model.clone()),
            }),
            other => Err(OracleError::Config(format!(
                "unknown provider '{}'. Valid: anthropic, openai, openai-compatible, ollama, local",
                other
            ))),
        }
    }

    /// Human-readable provider name.
    pub fn provider_name(&self) -> &str {
        match self {
            Self::Anthropic { .. } => "Anthropic",
            Self::OpenAI { .. } => "OpenAI",
            Self::OpenAICompatible { .. } => "OpenAI-Compatible",
            Self::Ollama { .. } => "Ollama (local)",
            Self::Local { .. } => "Local",
        }
    }

    /// Model name in use.
    pub fn model_name(&self) -> &str {
        match self {
            Self::Anthropic { model, .. }
            | Self::OpenAI { model, .. }
            | Self::OpenAICompatible { model, .. }
            | Self::Ollama { model, .. }
            | Self::Local { model, .. } => model,
        }
    }
}

// ---------------------------------------------------------------------------
// API Request / Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub(crate) struct AnthropicRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<Message>,
    pub system: String,
}

#[derive(Serialize)]
pub(crate) struct OpenAIRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub(crate) fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct AnthropicResponse {
    pub content: Vec<AnthropicContent>,
}

#[derive(Deserialize)]
pub(crate) struct AnthropicContent {
    #[serde(default)]
    pub text: String,
}

#[derive(Deserialize)]
pub(crate) struct OpenAIResponse {
    pub choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
pub(crate) struct OpenAIChoice {
    pub message: OpenAIChoiceMessage,
}

#[derive(Deserialize)]
pub(crate) struct OpenAIChoiceMessage {
    #[serde(default)]
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_anthropic_key_wins() {
        let env = env_from(&[("ANTHROPIC_API_KEY", "a"), ("OPENAI_API_KEY", "o")]);
        let provider = LlmProvider::from_cloud_keys(env).unwrap();
        assert_eq!(provider.provider_name(), "Anthropic");
        assert_eq!(provider.model_name(), DEFAULT_ANTHROPIC_MODEL);
    }

    #[test]
    fn test_model_override() {
        let env = env_from(&[("OPENAI_API_KEY", "o"), ("FNSYNTH_MODEL", "gpt-4.1")]);
        let provider = LlmProvider::from_cloud_keys(env).unwrap();
        assert_eq!(provider.model_name(), "gpt-4.1");
    }

    #[test]
    fn test_compatible_requires_model() {
        let env = env_from(&[
            ("FNSYNTH_API_KEY", "k"),
            ("FNSYNTH_BASE_URL", "https://example.test/v1"),
        ]);
        assert!(LlmProvider::from_cloud_keys(env).is_none());
    }

    #[test]
    fn test_no_keys() {
        assert!(LlmProvider::from_cloud_keys(env_from(&[])).is_none());
    }

    #[test]
    fn test_forced_provider_missing_key() {
        let config = LlmConfig::default();
        let err = LlmProvider::from_forced_provider("anthropic", &config, env_from(&[]))
            .unwrap_err();
        assert!(matches!(err, OracleError::Config(_)));
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_forced_ollama_uses_config() {
        let config = LlmConfig::default();
        let provider =
            LlmProvider::from_forced_provider("ollama", &config, env_from(&[])).unwrap();
        assert_eq!(
            provider,
            LlmProvider::Ollama {
                base_url: "http://localhost:11434".to_string(),
                model: "qwen2.5-coder:7b".to_string(),
            }
        );
    }

    #[test]
    fn test_forced_unknown_provider() {
        let config = LlmConfig::default();
        assert!(LlmProvider::from_forced_provider("bogus", &config, env_from(&[])).is_err());
    }
}
