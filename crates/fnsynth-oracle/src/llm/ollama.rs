//! Ollama auto-detection and model availability checks.

use serde::Deserialize;
use std::time::Duration;

/// Response from Ollama's /api/tags endpoint.
#[derive(Deserialize)]
pub(crate) struct OllamaTagsResponse {
    pub models: Vec<OllamaModelInfo>,
}

#[derive(Deserialize)]
pub(crate) struct OllamaModelInfo {
    pub name: String,
}

/// Probe Ollama at `base_url`. Returns installed model names on success, None if unreachable.
pub(crate) async fn detect_ollama(base_url: &str) -> Option<Vec<String>> {
    let url = format!("{}/api/tags", base_url.trim_end_matches('/'));
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()
        .ok()?;

    let resp = client.get(&url).send().await.ok()?;
    let tags: OllamaTagsResponse = resp.json().await.ok()?;
    Some(tags.models.into_iter().map(|m| m.name).collect())
}

/// Check if a requested model is in the installed list.
/// Handles Ollama's naming: "qwen2.5-coder" matches "qwen2.5-coder:7b",
/// and "qwen2.5-coder:7b" matches an installed "qwen2.5-coder".
pub(crate) fn model_is_available(installed: &[String], requested: &str) -> bool {
    let requested_lower = requested.to_lowercase();
    installed.iter().any(|m| {
        let m = m.to_lowercase();
        m == requested_lower
            || m.starts_with(&format!("{}:", requested_lower))
            || requested_lower.starts_with(&format!("{}:", m))
    })
}
