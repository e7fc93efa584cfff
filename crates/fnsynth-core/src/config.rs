//! Pipeline configuration.
//!
//! Load order: `.fnsynth/config.toml` → environment variables → defaults.
//! The loaded value is passed explicitly into each pipeline stage; nothing
//! reads process-wide flags after this point.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    pub generation: GenerationConfig,
    pub enhancer: EnhancerConfig,
    pub testing: TestingConfig,
    pub tools: ToolsConfig,
    pub llm: LlmConfig,
}

/// Generate-verify-retry loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Retry budget after the initial attempt. Signed so that a negative value
    /// in a config file is reported instead of silently wrapping.
    pub max_retries: i64,
}

/// How the pipeline is being driven; selects the oracle timeout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// A person is waiting on the result.
    #[default]
    Interactive,
    /// Batch runs and test suites.
    Automated,
}

/// Domain test enhancement settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancerConfig {
    /// Skip the oracle entirely and return the fallback corpus.
    pub skip_oracle: bool,
    pub mode: ExecutionMode,
    pub interactive_timeout_ms: u64,
    pub automated_timeout_ms: u64,
    /// Number of domain cases requested from the oracle (lower bound).
    pub min_cases: usize,
    /// Number of domain cases requested from the oracle (upper bound).
    pub max_cases: usize,
    /// Maximum length of oracle-supplied free text after sanitization.
    pub max_field_len: usize,
}

impl EnhancerConfig {
    /// Hard timeout for the enhancer's oracle call in the current mode.
    pub fn timeout(&self) -> Duration {
        let ms = match self.mode {
            ExecutionMode::Interactive => self.interactive_timeout_ms,
            ExecutionMode::Automated => self.automated_timeout_ms,
        };
        Duration::from_millis(ms)
    }
}

/// Test execution and verdict settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TestingConfig {
    /// Minimum pass rate for a suite to count as successful.
    pub pass_threshold: f64,
    /// Label attached to reported test results.
    pub label: String,
}

/// External tool commands. Each is split on whitespace; the scratch file
/// path is appended as the last argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub type_checker: String,
    pub executor: String,
    /// Empty disables linting.
    pub linter: String,
}

/// Oracle provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Force a provider: anthropic, openai, openai-compatible, ollama, local.
    pub provider: Option<String>,
    pub max_tokens: u32,
    pub local_url: String,
    pub local_model: String,
    pub request_timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self { max_retries: 3 }
    }
}

impl Default for EnhancerConfig {
    fn default() -> Self {
        Self {
            skip_oracle: false,
            mode: ExecutionMode::Interactive,
            interactive_timeout_ms: 30_000,
            automated_timeout_ms: 5_000,
            min_cases: 5,
            max_cases: 8,
            max_field_len: 500,
        }
    }
}

impl Default for TestingConfig {
    fn default() -> Self {
        Self {
            pass_threshold: 0.6,
            label: "Generated Tests".to_string(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            type_checker: "npx --no-install tsc --noEmit --strict --target ES2020 --lib ES2020 --pretty false"
                .to_string(),
            executor: "npx --no-install tsx".to_string(),
            linter: String::new(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: None,
            max_tokens: 4096,
            local_url: "http://localhost:11434".to_string(),
            local_model: "qwen2.5-coder:7b".to_string(),
            request_timeout_secs: 120,
        }
    }
}

/// Helper to parse an env var and apply it to a config field.
fn env_override<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(v) = std::env::var(var)
        && let Ok(n) = v.parse()
    {
        *target = n;
    }
}

fn env_flag(var: &str, target: &mut bool) {
    if let Ok(v) = std::env::var(var)
        && let Some(flag) = parse_flag(&v)
    {
        *target = flag;
    }
}

/// Shell-style boolean: `1`/`true`/`yes`/`on` and `0`/`false`/`no`/`off`,
/// case-insensitive.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_string(var: &str, target: &mut String) {
    if let Ok(v) = std::env::var(var) {
        *target = v;
    }
}

impl SynthConfig {
    /// Load config from `.fnsynth/config.toml` in the project root, with env var overrides.
    /// Falls back to defaults if no config file exists.
    pub fn load(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join(".fnsynth").join("config.toml");

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        env_override("FNSYNTH_MAX_RETRIES", &mut self.generation.max_retries);
        env_flag("FNSYNTH_SKIP_ORACLE", &mut self.enhancer.skip_oracle);
        if let Ok(mode) = std::env::var("FNSYNTH_EXECUTION_MODE") {
            match mode.to_lowercase().as_str() {
                "automated" | "test" | "ci" => self.enhancer.mode = ExecutionMode::Automated,
                "interactive" => self.enhancer.mode = ExecutionMode::Interactive,
                _ => {}
            }
        }
        if let Ok(v) = std::env::var("FNSYNTH_ORACLE_TIMEOUT_MS")
            && let Ok(ms) = v.parse::<u64>()
        {
            self.enhancer.interactive_timeout_ms = ms;
            self.enhancer.automated_timeout_ms = ms;
        }
        env_override("FNSYNTH_PASS_THRESHOLD", &mut self.testing.pass_threshold);
        env_string("FNSYNTH_TSC", &mut self.tools.type_checker);
        env_string("FNSYNTH_EXECUTOR", &mut self.tools.executor);
        env_string("FNSYNTH_LINTER", &mut self.tools.linter);
        if let Ok(p) = std::env::var("FNSYNTH_PROVIDER") {
            self.llm.provider = Some(p);
        }
    }

    /// Reject values no stage can work with.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.testing.pass_threshold) {
            anyhow::bail!(
                "pass_threshold ({}) must be between 0.0 and 1.0",
                self.testing.pass_threshold
            );
        }
        if self.enhancer.interactive_timeout_ms == 0 || self.enhancer.automated_timeout_ms == 0 {
            anyhow::bail!("enhancer timeouts must be greater than zero");
        }
        if self.enhancer.min_cases > self.enhancer.max_cases {
            anyhow::bail!(
                "enhancer.min_cases ({}) must not exceed enhancer.max_cases ({})",
                self.enhancer.min_cases,
                self.enhancer.max_cases
            );
        }
        if self.tools.type_checker.trim().is_empty() || self.tools.executor.trim().is_empty() {
            anyhow::bail!("tools.type_checker and tools.executor must be set");
        }
        Ok(())
    }
}
