//! Generative oracle: turns a prompt into candidate code or test descriptions.
//!
//! The pipeline only sees the [`CodeOracle`] trait. [`LlmClient`] is the
//! production implementation backed by hosted or local LLM APIs.

pub mod llm;
pub mod prompt;
pub mod reply;

pub use llm::{LlmClient, LlmProvider};

use async_trait::async_trait;

/// Errors from oracle calls.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// The service could not be reached (connection refused, DNS, timeout).
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
    /// The service is up but the requested model is not installed or loaded.
    #[error("model '{0}' is not loaded")]
    NoModelLoaded(String),
    /// The service answered with an error or an unusable body.
    #[error("provider error: {0}")]
    Provider(String),
    /// No provider could be resolved from configuration and environment.
    #[error("oracle configuration: {0}")]
    Config(String),
}

/// A text-in, text-out generative service.
#[async_trait]
pub trait CodeOracle: Send + Sync {
    /// Complete `prompt` under the given system instructions.
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, OracleError>;

    /// Human-readable description for logs.
    fn describe(&self) -> String {
        "oracle".to_string()
    }
}
