//! # Facetsearch
//!
//! Search-request construction and result shaping for a Solr-style
//! full-text engine.
//!
//! Facetsearch turns user-supplied query text, facet filters, sort order and
//! pagination parameters into a structured [`SearchRequest`], submits it, and
//! post-processes the raw response into facet counts, pagination metadata and
//! toggleable filter state for a presentation layer.
//!
//! ## Components
//!
//! - [`services::SearchRequestBuilder`]: parser selection, boosts, facet and
//!   group directives, filter-query serialization
//! - [`services::process_facets`]: flattened facet arrays to ordered maps
//! - [`services::compute_pagination`]: total pages and the sliding page window
//! - [`services::is_active`] / [`services::toggle`]: pure filter-toggle state
//! - [`client::SearchClient`]: executes requests with timeouts and bounded retries
//! - [`indexer::Indexer`]: record-to-document mapping and batch reindexing
//!
//! ## Example
//!
//! ```rust,ignore
//! use facetsearch::{SearchClient, SearchConfig, SearchOptions};
//!
//! let config = SearchConfig::load_default();
//! let client = SearchClient::from_config(&config);
//! let outcome = client.search(&SearchOptions::new().with_query("dogs"))?;
//! println!("{} hits", outcome.total_found);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod client;
pub mod config;
pub mod indexer;
pub mod models;
pub mod observability;
pub mod services;

pub use client::{HttpSearchEngine, ResilientEngine, SearchClient, SearchEngine, SearchOutcome};
pub use config::SearchConfig;
pub use models::{
    FacetMap, FilterSet, FilterTerm, FilterValue, PaginationState, QueryParser, SearchOptions,
    SearchRequest,
};

/// Error type for facetsearch operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Non-positive page size reaches pagination |
/// | `MalformedResponse` | Odd-length facet arrays, undecodable engine JSON |
/// | `EngineUnavailable` | Connect failures, timeouts, open circuit breaker |
/// | `EngineError` | The engine answered with a non-success status |
/// | `OperationFailed` | Config file I/O or parse failures, logging init |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - `per_page` is zero when computing pagination
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The engine response does not have the expected shape.
    ///
    /// Raised when:
    /// - A facet field carries an odd number of value/count elements
    /// - A facet count is not a non-negative integer
    /// - The body is not JSON or lacks the `response` section
    #[error("malformed response: {reason}")]
    MalformedResponse {
        /// What was wrong with the response.
        reason: String,
    },

    /// The engine could not be reached.
    ///
    /// Raised when:
    /// - The TCP connection fails or the request times out
    /// - The circuit breaker is open after repeated failures
    #[error("search engine unavailable during '{operation}': {cause}")]
    EngineUnavailable {
        /// The operation that was attempted.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// The engine answered with an error status.
    #[error("search engine '{operation}' returned {status}: {body}")]
    EngineError {
        /// The operation that was attempted.
        operation: String,
        /// HTTP status code.
        status: u16,
        /// Response body as returned by the engine.
        body: String,
    },

    /// A local operation failed.
    ///
    /// Raised when:
    /// - The config file cannot be read or parsed
    /// - The tracing subscriber is already installed
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Returns true for failures worth retrying: transport errors and 5xx answers.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::EngineUnavailable { .. } => true,
            Self::EngineError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Result type alias for facetsearch operations.
pub type Result<T> = std::result::Result<T, Error>;
