//! Search engine client.
//!
//! [`SearchEngine`] is the transport seam: [`HttpSearchEngine`] speaks HTTP to
//! a Solr-compatible core and [`ResilientEngine`] wraps any engine with
//! retries and a circuit breaker. [`SearchClient`] ties the request builder,
//! one engine round trip and result shaping together.

mod http;
mod resilience;

pub use http::HttpSearchEngine;
pub use resilience::ResilientEngine;

use crate::config::SearchConfig;
use crate::indexer::Document;
use crate::models::{FacetMap, PaginationState, SearchOptions, SearchRequest};
use crate::services::{SearchRequestBuilder, compute_pagination, facets_from_response};
use crate::{Error, Result};
use serde_json::Value;
use std::time::Instant;

/// A full-text engine that can be queried and updated.
pub trait SearchEngine: Send + Sync {
    /// Engine name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Executes a query and returns the decoded response.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is unreachable, answers with an error
    /// status, or returns a body that is not JSON.
    fn select(&self, request: &SearchRequest) -> Result<Value>;

    /// Adds or replaces documents.
    ///
    /// # Errors
    ///
    /// Returns an error if the update is rejected or the engine is unreachable.
    fn add(&self, documents: &[Document]) -> Result<()>;

    /// Deletes every document matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the update is rejected or the engine is unreachable.
    fn delete_by_query(&self, query: &str) -> Result<()>;

    /// Makes pending updates visible to searches.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit is rejected or the engine is unreachable.
    fn commit(&self) -> Result<()>;
}

impl<E: SearchEngine + ?Sized> SearchEngine for Box<E> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn select(&self, request: &SearchRequest) -> Result<Value> {
        (**self).select(request)
    }

    fn add(&self, documents: &[Document]) -> Result<()> {
        (**self).add(documents)
    }

    fn delete_by_query(&self, query: &str) -> Result<()> {
        (**self).delete_by_query(query)
    }

    fn commit(&self) -> Result<()> {
        (**self).commit()
    }
}

/// Result of one search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// The engine response, verbatim.
    pub raw: Value,
    /// Matching documents for the current page.
    pub documents: Vec<Value>,
    /// Total number of matches.
    pub total_found: u64,
    /// Facet counts, in response order.
    pub facets: FacetMap,
    /// Page count and window.
    pub pagination: PaginationState,
}

/// Builds requests, executes them, and shapes the results.
pub struct SearchClient<E: SearchEngine = ResilientEngine<HttpSearchEngine>> {
    engine: E,
    config: SearchConfig,
}

impl SearchClient {
    /// Creates an HTTP client with retries and a circuit breaker from `config`.
    #[must_use]
    pub fn from_config(config: &SearchConfig) -> Self {
        let http = HttpSearchEngine::new(&config.endpoint, &config.http);
        let engine = ResilientEngine::new(http, config.resilience);
        Self::new(engine, config.clone())
    }
}

impl<E: SearchEngine> SearchClient<E> {
    /// Creates a client over any engine.
    #[must_use]
    pub const fn new(engine: E, config: SearchConfig) -> Self {
        Self { engine, config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Returns the engine.
    #[must_use]
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// Builds the request for `options` without executing it.
    #[must_use]
    pub fn build_request(&self, options: &SearchOptions) -> SearchRequest {
        SearchRequestBuilder::new(&self.config).build(options)
    }

    /// Runs a search.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine call fails or the response lacks the
    /// expected shape.
    pub fn search(&self, options: &SearchOptions) -> Result<SearchOutcome> {
        let start = Instant::now();
        let request = self.build_request(options);
        let raw = self.engine.select(&request)?;

        let (total_found, documents) = read_matches(&raw)?;
        let facets = facets_from_response(&raw)?;
        let pagination = compute_pagination(total_found, options.per_page.max(1), options.page)?;

        tracing::info!(
            engine = self.engine.name(),
            total_found = total_found,
            returned = documents.len(),
            facets = facets.len(),
            page = options.page,
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Search completed"
        );

        Ok(SearchOutcome {
            raw,
            documents,
            total_found,
            facets,
            pagination,
        })
    }
}

/// Reads the match count and documents from `response`, or from the first
/// group of a grouped response.
fn read_matches(raw: &Value) -> Result<(u64, Vec<Value>)> {
    if let Some(response) = raw.get("response") {
        let total = response
            .get("numFound")
            .and_then(Value::as_u64)
            .ok_or_else(|| Error::MalformedResponse {
                reason: "response.numFound is missing or not a count".to_string(),
            })?;
        let docs = response
            .get("docs")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        return Ok((total, docs));
    }

    let group = raw
        .get("grouped")
        .and_then(Value::as_object)
        .and_then(|groups| groups.values().next())
        .ok_or_else(|| Error::MalformedResponse {
            reason: "body has neither a 'response' nor a 'grouped' section".to_string(),
        })?;
    let total = group.get("matches").and_then(Value::as_u64).unwrap_or(0);
    let docs = group
        .get("groups")
        .and_then(Value::as_array)
        .map(|groups| {
            groups
                .iter()
                .filter_map(|g| g.pointer("/doclist/docs").and_then(Value::as_array))
                .flatten()
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    Ok((total, docs))
}
