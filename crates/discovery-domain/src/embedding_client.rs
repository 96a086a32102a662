//! Thin HTTP client for the embedding model (§1 "the embedding model itself
//! [is] treated as a collaborator"; §6 configuration). Same `reqwest`
//! idiom as [`crate::llm_client`] and [`crate::search_client`]: owns
//! URL/auth, never interprets anything beyond the raw vector.

use discovery_core::config::EmbeddingConfig;
use std::time::Duration;

#[derive(Clone)]
pub struct EmbeddingClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl EmbeddingClient {
    pub fn new(config: &EmbeddingConfig) -> Self {
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

    /// Embeds `text` into a single dense vector. Skipped entirely by the
    /// orchestrator when the search query is empty (§4.9 step 7); callers
    /// treat any error here as a cue to fall back to a filter-only search.
    pub async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut request = self.http.post(&self.endpoint).json(&serde_json::json!({
            "model": self.model,
            "input": text,
        }));

        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?.error_for_status()?;
        let parsed: serde_json::Value = response.json().await?;

        let vector = parsed
            .get("data")
            .and_then(|d| d.get(0))
            .and_then(|d| d.get("embedding"))
            .and_then(|v| v.as_array())
            .ok_or_else(|| anyhow::anyhow!("embedding response missing data[0].embedding"))?;

        vector
            .iter()
            .map(|v| v.as_f64().map(|f| f as f32).ok_or_else(|| anyhow::anyhow!("embedding vector contained a non-numeric element")))
            .collect()
    }
}
