//! Thin HTTP client for the text-search engine (§6 "Search engine document
//! schema"). The client owns URL/auth-header construction and
//! response-shape parsing; it never builds query bodies itself — that is
//! [`crate::translator`]'s and [`crate::canonicalizer`]'s job. Same
//! `reqwest` idiom as [`crate::llm_client`].

use discovery_core::config::SearchEngineConfig;
use serde_json::Value;
use std::time::Duration;

#[derive(Clone)]
pub struct SearchClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl SearchClient {
    pub fn new(config: &SearchEngineConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .expect("reqwest client construction should not fail for a simple HTTP client");

        Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// Runs a single query body (as produced by [`crate::translator`])
    /// against the companies index and returns the raw response body.
    pub async fn search(&self, index: &str, body: &Value) -> anyhow::Result<Value> {
        let response = self
            .request(reqwest::Method::POST, &format!("/{}/_search", index))
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Runs several query bodies in one round trip against an index's
    /// multi-search endpoint (§4.1 "one engine round trip per segment").
    /// Returns one response body per input body, in order.
    pub async fn multi_search(&self, index: &str, bodies: &[Value]) -> anyhow::Result<Vec<Value>> {
        if bodies.is_empty() {
            return Ok(Vec::new());
        }

        let mut ndjson = String::new();
        for body in bodies {
            ndjson.push_str("{}\n");
            ndjson.push_str(&serde_json::to_string(body)?);
            ndjson.push('\n');
        }

        let response = self
            .request(reqwest::Method::POST, &format!("/{}/_msearch", index))
            .header("Content-Type", "application/x-ndjson")
            .body(ndjson)
            .send()
            .await?
            .error_for_status()?;

        let parsed: Value = response.json().await?;
        let responses = parsed
            .get("responses")
            .and_then(|r| r.as_array())
            .cloned()
            .unwrap_or_default();
        Ok(responses)
    }
}
