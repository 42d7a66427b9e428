//! Configuration management.
//!
//! [`SearchConfig`] is built once at startup and handed by reference to the
//! request builder, the client and the indexer. Values come from defaults,
//! then an optional TOML file, then environment overrides.

mod defaults;

pub use defaults::{QueryField, SearchDefaults, default_query_fields};

use serde::Deserialize;

/// Location of the search engine core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEndpoint {
    /// Host name.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Path of the core, e.g. `/solr/default`.
    pub core_path: String,
}

impl Default for EngineEndpoint {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8983,
            core_path: "/solr/default".to_string(),
        }
    }
}

impl EngineEndpoint {
    /// Returns `http://host:port/core_path`.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.core_path)
    }
}

/// HTTP timeouts for engine calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpConfig {
    /// Request timeout in milliseconds (0 to disable).
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds (0 to disable).
    pub connect_timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            connect_timeout_ms: 3_000,
        }
    }
}

/// Retry and circuit-breaker settings for engine calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResilienceConfig {
    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,
    /// Fixed backoff between retries in milliseconds.
    pub retry_backoff_ms: u64,
    /// Consecutive failures before the circuit opens.
    pub breaker_failure_threshold: u32,
    /// How long the circuit stays open before a trial call.
    pub breaker_reset_timeout_ms: u64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_backoff_ms: 100,
            breaker_failure_threshold: 5,
            breaker_reset_timeout_ms: 30_000,
        }
    }
}

/// Indexing settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexingConfig {
    /// Records per add + commit round.
    pub batch_size: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self { batch_size: 50 }
    }
}

/// Main configuration for facetsearch.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Engine location.
    pub endpoint: EngineEndpoint,
    /// Boosted query fields, in `qf` order.
    pub query_fields: Vec<QueryField>,
    /// Request defaults.
    pub defaults: SearchDefaults,
    /// HTTP timeouts.
    pub http: HttpConfig,
    /// Retry policy.
    pub resilience: ResilienceConfig,
    /// Indexing settings.
    pub indexing: IndexingConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: EngineEndpoint::default(),
            query_fields: default_query_fields(),
            defaults: SearchDefaults::default(),
            http: HttpConfig::default(),
            resilience: ResilienceConfig::default(),
            indexing: IndexingConfig::default(),
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Engine section.
    pub engine: Option<ConfigFileEngine>,
    /// Query fields as `name` or `name^boost`.
    pub query_fields: Option<Vec<String>>,
    /// Defaults section.
    pub defaults: Option<ConfigFileDefaults>,
    /// Indexing section.
    pub indexing: Option<ConfigFileIndexing>,
}

/// Engine section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileEngine {
    /// Host name.
    pub host: Option<String>,
    /// Port.
    pub port: Option<u16>,
    /// Core path.
    pub core_path: Option<String>,
    /// Request timeout.
    pub timeout_ms: Option<u64>,
    /// Connect timeout.
    pub connect_timeout_ms: Option<u64>,
    /// Retries for transient failures.
    pub max_retries: Option<u32>,
    /// Backoff between retries.
    pub retry_backoff_ms: Option<u64>,
    /// Failures before the breaker opens.
    pub breaker_failure_threshold: Option<u32>,
    /// Breaker open duration.
    pub breaker_reset_ms: Option<u64>,
}

/// Defaults section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileDefaults {
    /// Rows per page.
    pub per_page: Option<u32>,
    /// Minimum match.
    pub minimum_match: Option<String>,
    /// Phrase slop.
    pub phrase_slop: Option<u32>,
    /// Facet limit.
    pub facet_limit: Option<i64>,
    /// Facet min count.
    pub facet_min_count: Option<u32>,
    /// Group limit.
    pub group_limit: Option<u32>,
}

/// Indexing section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileIndexing {
    /// Batch size.
    pub batch_size: Option<usize>,
}

impl SearchConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path, then applies env overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &std::path::Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: e.to_string(),
            })?;

        let config = Self::from_toml_str(&contents)?;
        Ok(config.with_env_overrides())
    }

    /// Parses configuration from TOML text without env overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for [`ConfigFile`].
    pub fn from_toml_str(contents: &str) -> crate::Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;
        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks `<config dir>/facetsearch/config.toml`, then
    /// `~/.config/facetsearch/config.toml`. Falls back to defaults; env
    /// overrides apply in every case.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::new().with_env_overrides();
        };

        let candidates = [
            base_dirs
                .config_dir()
                .join("facetsearch")
                .join("config.toml"),
            base_dirs
                .home_dir()
                .join(".config")
                .join("facetsearch")
                .join("config.toml"),
        ];
        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::load_from_file(path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Ignoring config file"),
            }
        }

        Self::new().with_env_overrides()
    }

    /// Converts a `ConfigFile` to `SearchConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::new();

        if let Some(engine) = file.engine {
            if let Some(host) = engine.host {
                config.endpoint.host = host;
            }
            if let Some(port) = engine.port {
                config.endpoint.port = port;
            }
            if let Some(core_path) = engine.core_path {
                config.endpoint.core_path = core_path;
            }
            if let Some(v) = engine.timeout_ms {
                config.http.timeout_ms = v;
            }
            if let Some(v) = engine.connect_timeout_ms {
                config.http.connect_timeout_ms = v;
            }
            if let Some(v) = engine.max_retries {
                config.resilience.max_retries = v;
            }
            if let Some(v) = engine.retry_backoff_ms {
                config.resilience.retry_backoff_ms = v;
            }
            if let Some(v) = engine.breaker_failure_threshold {
                config.resilience.breaker_failure_threshold = v.max(1);
            }
            if let Some(v) = engine.breaker_reset_ms {
                config.resilience.breaker_reset_timeout_ms = v;
            }
        }
        if let Some(fields) = file.query_fields {
            config.query_fields = fields.iter().filter_map(|f| QueryField::parse(f)).collect();
        }
        if let Some(defaults) = file.defaults {
            if let Some(v) = defaults.per_page {
                config.defaults.per_page = v.max(1);
            }
            if let Some(v) = defaults.minimum_match {
                config.defaults.minimum_match = v;
            }
            if let Some(v) = defaults.phrase_slop {
                config.defaults.phrase_slop = v;
            }
            if let Some(v) = defaults.facet_limit {
                config.defaults.facet_limit = v;
            }
            if let Some(v) = defaults.facet_min_count {
                config.defaults.facet_min_count = v;
            }
            if let Some(v) = defaults.group_limit {
                config.defaults.group_limit = v;
            }
        }
        if let Some(indexing) = file.indexing {
            if let Some(v) = indexing.batch_size {
                config.indexing.batch_size = v.max(1);
            }
        }

        config
    }

    /// Applies environment variable overrides.
    ///
    /// `SOLR_HOST`, `SOLR_PORT` and `SOLR_CORE_PATH` locate the engine;
    /// `FACETSEARCH_TIMEOUT_MS`, `FACETSEARCH_CONNECT_TIMEOUT_MS`,
    /// `FACETSEARCH_MAX_RETRIES` and `FACETSEARCH_RETRY_BACKOFF_MS` tune calls.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary variable lookup.
    #[must_use]
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SOLR_HOST").filter(|v| !v.trim().is_empty()) {
            self.endpoint.host = v;
        }
        if let Some(v) = lookup("SOLR_PORT").and_then(|v| v.parse().ok()) {
            self.endpoint.port = v;
        }
        if let Some(v) = lookup("SOLR_CORE_PATH") {
            self.endpoint.core_path = v;
        }
        if let Some(v) = lookup("FACETSEARCH_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.http.timeout_ms = v;
        }
        if let Some(v) = lookup("FACETSEARCH_CONNECT_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.http.connect_timeout_ms = v;
        }
        if let Some(v) = lookup("FACETSEARCH_MAX_RETRIES").and_then(|v| v.parse().ok()) {
            self.resilience.max_retries = v;
        }
        if let Some(v) = lookup("FACETSEARCH_RETRY_BACKOFF_MS").and_then(|v| v.parse().ok()) {
            self.resilience.retry_backoff_ms = v;
        }
        self
    }

    /// Sets the engine endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: EngineEndpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Replaces the query fields.
    #[must_use]
    pub fn with_query_fields(mut self, fields: Vec<QueryField>) -> Self {
        self.query_fields = fields;
        self
    }
}
