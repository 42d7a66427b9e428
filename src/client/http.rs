//! HTTP transport for a Solr-compatible core.

use super::SearchEngine;
use crate::config::{EngineEndpoint, HttpConfig};
use crate::indexer::Document;
use crate::models::SearchRequest;
use crate::{Error, Result};
use serde_json::{Value, json};
use std::time::Duration;

/// Talks to `{base}/select` and `{base}/update` over blocking HTTP.
pub struct HttpSearchEngine {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpSearchEngine {
    /// Creates an engine for `endpoint` with timeouts from `http`.
    #[must_use]
    pub fn new(endpoint: &EngineEndpoint, http: &HttpConfig) -> Self {
        Self {
            base_url: endpoint.base_url(),
            client: build_http_client(http),
        }
    }

    /// Returns the core's base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post_update(&self, operation: &'static str, body: &Value) -> Result<()> {
        let url = format!("{}/update", self.base_url);
        let response = self
            .client
            .post(&url)
            .query(&[("wt", "json")])
            .json(body)
            .send()
            .map_err(|e| transport_error(operation, &url, &e))?;
        check_status(operation, response).map(|_| ())
    }
}

impl SearchEngine for HttpSearchEngine {
    fn name(&self) -> &'static str {
        "solr"
    }

    fn select(&self, request: &SearchRequest) -> Result<Value> {
        let url = format!("{}/select", self.base_url);
        let mut params = request.to_params();
        // responses are always decoded as JSON here
        for (key, value) in &mut params {
            if key == "wt" {
                *value = "json".to_string();
            }
        }

        tracing::debug!(url = %url, params = params.len(), "Sending select request");
        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .map_err(|e| transport_error("select", &url, &e))?;
        let response = check_status("select", response)?;

        response.json::<Value>().map_err(|e| Error::MalformedResponse {
            reason: format!("select response is not JSON: {e}"),
        })
    }

    fn add(&self, documents: &[Document]) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }
        self.post_update("add", &Value::from(documents.to_vec()))
    }

    fn delete_by_query(&self, query: &str) -> Result<()> {
        self.post_update("delete", &json!({"delete": {"query": query}}))
    }

    fn commit(&self) -> Result<()> {
        self.post_update("commit", &json!({"commit": {}}))
    }
}

/// Builds a blocking client; a zero timeout disables that timeout.
fn build_http_client(config: &HttpConfig) -> reqwest::blocking::Client {
    let mut builder = reqwest::blocking::Client::builder();
    if config.timeout_ms > 0 {
        builder = builder.timeout(Duration::from_millis(config.timeout_ms));
    }
    if config.connect_timeout_ms > 0 {
        builder = builder.connect_timeout(Duration::from_millis(config.connect_timeout_ms));
    }

    builder.build().unwrap_or_else(|err| {
        tracing::warn!("Failed to build search HTTP client: {err}");
        reqwest::blocking::Client::new()
    })
}

fn transport_error(operation: &str, url: &str, e: &reqwest::Error) -> Error {
    let error_kind = if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connect"
    } else if e.is_request() {
        "request"
    } else {
        "unknown"
    };
    tracing::error!(
        engine = "solr",
        operation = operation,
        url = %url,
        error = %e,
        error_kind = error_kind,
        is_timeout = e.is_timeout(),
        is_connect = e.is_connect(),
        "Search engine request failed"
    );
    Error::EngineUnavailable {
        operation: operation.to_string(),
        cause: format!("{error_kind} error: {e}"),
    }
}

fn check_status(
    operation: &str,
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    tracing::error!(
        engine = "solr",
        operation = operation,
        status = %status,
        body = %body,
        "Search engine returned error response"
    );
    Err(Error::EngineError {
        operation: operation.to_string(),
        status: status.as_u16(),
        body,
    })
}
