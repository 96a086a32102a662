//! Thin HTTP client for an OpenAI-chat-completions-compatible language
//! model (§6 "Language model client (collaborator contract, owned by this
//! service)"). Owns the connection, URL, and auth header; never interprets
//! the response payload beyond parsing it as `serde_json::Value` — that is
//! each calling pipeline stage's job.
//!
//! Grounded in the outbound `reqwest::Client` idiom this codebase family
//! already uses for process-wide singleton HTTP collaborators, and in
//! `examples/original_source/backend/backend/llm/client.py`'s
//! request/response shape.

use discovery_core::config::LlmConfig;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::warn;

#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl LlmClient {
    pub fn new(config: &LlmConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .expect("reqwest client construction should not fail for a simple HTTP client");

        Self {
            http,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Issues a single chat-completion call with `response_format: {"type":
    /// "json_object"}` forced, per §6, and returns the assistant message's
    /// content parsed as JSON. Callers treat any error here (network,
    /// non-2xx, malformed JSON) as a cue to run their own documented
    /// fallback — this method never panics and propagates failures as
    /// `reqwest::Error`/parse errors for the caller to catch broadly.
    pub async fn complete_json(&self, system_prompt: &str, user_prompt: &str) -> anyhow::Result<Value> {
        let body = json!({
            "model": self.model,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt},
            ],
        });

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let parsed: Value = response.json().await?;
        let content = parsed
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| anyhow::anyhow!("language model response missing choices[0].message.content"))?;

        serde_json::from_str(content).map_err(|e| {
            warn!(error = %e, "language model returned non-JSON content");
            anyhow::anyhow!("language model content was not valid JSON: {e}")
        })
    }
}
