//! Integration tests for facetsearch.
//!
//! Drives the full request cycle against an in-memory engine: raw query
//! string, normalization, request building, response shaping and the links
//! a view renders from the result.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use facetsearch::config::SearchConfig;
use facetsearch::indexer::{Document, Indexer, MapRecord, MapperRegistry, MemorySource};
use facetsearch::models::{FilterValue, SearchRequest};
use facetsearch::services::{
    self, FilterLink, RawParams, ResponseFormat, facet_options, normalize, render_pagination,
};
use facetsearch::{Error, Result, SearchClient, SearchEngine};
use serde_json::{Value, json};
use std::io::Write;
use std::sync::Mutex;

/// Answers every select with a fixed body and records what it was sent.
struct FakeEngine {
    response: Value,
    selects: Mutex<Vec<Vec<(String, String)>>>,
    documents: Mutex<Vec<Document>>,
    deletes: Mutex<Vec<String>>,
    commits: Mutex<usize>,
}

impl FakeEngine {
    fn new(response: Value) -> Self {
        Self {
            response,
            selects: Mutex::new(Vec::new()),
            documents: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            commits: Mutex::new(0),
        }
    }

    fn last_params(&self) -> Vec<(String, String)> {
        self.selects.lock().unwrap().last().cloned().unwrap()
    }
}

impl SearchEngine for FakeEngine {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn select(&self, request: &SearchRequest) -> Result<Value> {
        self.selects.lock().unwrap().push(request.to_params());
        Ok(self.response.clone())
    }

    fn add(&self, documents: &[Document]) -> Result<()> {
        self.documents.lock().unwrap().extend_from_slice(documents);
        Ok(())
    }

    fn delete_by_query(&self, query: &str) -> Result<()> {
        self.deletes.lock().unwrap().push(query.to_string());
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        *self.commits.lock().unwrap() += 1;
        Ok(())
    }
}

fn catalog_response() -> Value {
    json!({
        "responseHeader": {"status": 0},
        "response": {"numFound": 1000, "start": 480, "docs": [{"id": "article_481", "title": "Dogs"}]},
        "facet_counts": {"facet_fields": {
            "record_type": ["article", 700, "event", 300],
            "tag": ["pets", 40, "news", 12]
        }}
    })
}

fn values_of<'a>(params: &'a [(String, String)], key: &str) -> Vec<&'a str> {
    params
        .iter()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .collect()
}

#[test]
fn test_full_request_cycle() {
    let config = SearchConfig::new();
    let raw = RawParams::from_query_str(
        "/search?q=dogs&page=25&facet=true&facet.field=record_type&facet.field[]=tag\
         &filters[tag][]=pets&filters[status]=&lucene=0",
    );
    let request = normalize(&raw, &config.defaults);
    assert_eq!(request.format, ResponseFormat::Html);

    let client = SearchClient::new(FakeEngine::new(catalog_response()), config);
    let outcome = client.search(&request.options).unwrap();

    let params = client.engine().last_params();
    assert_eq!(values_of(&params, "defType"), vec!["edismax"]);
    assert_eq!(values_of(&params, "q"), vec!["dogs"]);
    assert_eq!(values_of(&params, "start"), vec!["480"]);
    assert_eq!(values_of(&params, "rows"), vec!["20"]);
    assert_eq!(values_of(&params, "fq"), vec!["tag: \"pets\""]);
    assert_eq!(values_of(&params, "qf"), vec!["title^1000 description^500"]);

    assert_eq!(outcome.total_found, 1000);
    assert_eq!(outcome.pagination.window_start, 20);
    assert_eq!(outcome.pagination.window_end, 29);

    let groups = facet_options(
        &outcome.facets,
        &request.options.filters,
        &request.base_href,
        &[],
    );
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].heading, "Record Type");

    // following the "news" link adds it next to "pets" and resets the page
    let news = &groups[1].links[1].0;
    assert!(matches!(news, FilterLink::Add { .. }));
    let next = normalize(&RawParams::from_query_str(news.href()), &client.config().defaults);
    assert_eq!(
        next.options.filters.get("tag"),
        Some(&FilterValue::multi(["news", "pets"]))
    );
    assert_eq!(next.options.page, 1);
    assert_eq!(next.options.query.as_deref(), Some("dogs"));

    // and the "pets" link removes the only active filter
    let pets = &groups[1].links[0].0;
    assert!(pets.is_active());
    let next = normalize(&RawParams::from_query_str(pets.href()), &client.config().defaults);
    assert!(next.options.filters.is_empty());

    let pages = render_pagination(&outcome.pagination, &request.base_href).unwrap();
    assert_eq!(pages.pages.len(), 10);
    assert!(pages.pages[5].current);
    let page_href = &pages.pages[5].href;
    assert!(page_href.contains("page=25"));
    assert!(page_href.contains("filters%5Btag%5D%5B%5D=pets"));
}

#[test]
fn test_json_format_returns_raw_response() {
    let config = SearchConfig::new();
    let request = normalize(&RawParams::from_query_str("format=json"), &config.defaults);
    assert_eq!(request.format, ResponseFormat::Json);

    let client = SearchClient::new(FakeEngine::new(catalog_response()), config);
    let outcome = client.search(&request.options).unwrap();
    assert_eq!(outcome.raw, catalog_response());
}

#[test]
fn test_literal_parser_request() {
    let config = SearchConfig::new();
    let request = normalize(
        &RawParams::from_query_str("q=title:dogs+AND+year:2020&lucene=1&mm=1"),
        &config.defaults,
    );
    let client = SearchClient::new(FakeEngine::new(catalog_response()), config);
    client.search(&request.options).unwrap();

    let params = client.engine().last_params();
    assert_eq!(values_of(&params, "defType"), vec!["lucene"]);
    assert_eq!(values_of(&params, "q"), vec!["title:dogs AND year:2020"]);
    assert!(values_of(&params, "q.alt").is_empty());
    assert!(values_of(&params, "mm").is_empty());
    assert!(values_of(&params, "qf").is_empty());
}

#[test]
fn test_reset_filters_drops_links_filters() {
    let config = SearchConfig::new();
    let request = normalize(
        &RawParams::from_query_str("q=cats&filters[tag]=pets&reset_filters=1"),
        &config.defaults,
    );
    assert!(request.options.filters.is_empty());
    assert_eq!(request.base_href.page_href(2), "/search?q=cats&page=2");
    assert!(services::active_filters(&request.options.filters, &request.base_href).is_empty());
}

#[test]
fn test_filters_keep_query_string_order() {
    let config = SearchConfig::new();
    let request = normalize(
        &RawParams::from_query_str(
            "filters[status]=open&filters[color]=red&filters[tag][]=zeta&filters[tag][]=alpha",
        ),
        &config.defaults,
    );

    let client = SearchClient::new(FakeEngine::new(catalog_response()), config);
    client.search(&request.options).unwrap();
    assert_eq!(
        values_of(&client.engine().last_params(), "fq"),
        vec![
            "status: \"open\"",
            "color: \"red\"",
            "tag: \"zeta\"",
            "tag: \"alpha\"",
        ]
    );

    let labels: Vec<String> = services::active_filters(&request.options.filters, &request.base_href)
        .iter()
        .map(|link| link.label().to_string())
        .collect();
    assert_eq!(labels, vec!["open", "red", "zeta", "alpha"]);
}

#[test]
fn test_malformed_facets_surface_as_error() {
    let engine = FakeEngine::new(json!({
        "response": {"numFound": 3, "docs": []},
        "facet_counts": {"facet_fields": {"tag": ["pets", 2, "news"]}}
    }));
    let client = SearchClient::new(engine, SearchConfig::new());
    let err = client
        .search(&facetsearch::SearchOptions::new().with_facets(["tag"]))
        .unwrap_err();
    assert!(matches!(err, Error::MalformedResponse { .. }));
}

#[test]
fn test_indexer_against_engine() {
    let engine = FakeEngine::new(Value::Null);
    let records = vec![
        MapRecord::from_json("article", "id", json!({"id": 1, "title": "Dogs", "body": ""})).unwrap(),
        MapRecord::from_json("article", "id", json!({"id": 2, "title": "Cats"})).unwrap(),
        MapRecord::from_json("event", "id", json!({"id": 1, "name": "Fair"})).unwrap(),
    ];
    let registry = MapperRegistry::new().with("event", |record, doc| {
        doc.insert("title".to_string(), json!(format!("Event {}", record.record_id())));
    });

    let config = SearchConfig::new();
    let stats = Indexer::new(&engine, &config.indexing)
        .with_registry(registry)
        .wipe_and_reindex_all(&MemorySource::new(records))
        .unwrap();

    assert_eq!(stats.documents, 3);
    assert_eq!(stats.batches, 2);
    assert_eq!(*engine.deletes.lock().unwrap(), vec!["*:*".to_string()]);
    assert_eq!(*engine.commits.lock().unwrap(), 3);

    let documents = engine.documents.lock().unwrap();
    let ids: Vec<&str> = documents.iter().map(|d| d["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["article_1", "article_2", "event_1"]);
    assert!(!documents[0].contains_key("body"));
    assert_eq!(documents[2]["title"], json!("Event 1"));
    assert_eq!(documents[2]["record_type"], json!("event"));
}

#[test]
fn test_config_file_drives_requests() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
query_fields = ["name^10", "body"]

[engine]
host = "search.internal"
port = 8080
core_path = "/solr/catalog"

[defaults]
per_page = 5
minimum_match = "100%"
"#
    )
    .unwrap();

    let config = SearchConfig::from_toml_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
    assert_eq!(
        config.endpoint.base_url(),
        "http://search.internal:8080/solr/catalog"
    );

    let request = normalize(&RawParams::from_query_str("q=x"), &config.defaults);
    assert_eq!(request.options.per_page, 5);
    let client = SearchClient::new(FakeEngine::new(catalog_response()), config);
    let built = client.build_request(&request.options);
    assert_eq!(built.query_fields.as_deref(), Some("name^10 body"));
    assert_eq!(built.minimum_match.as_deref(), Some("100%"));
    assert_eq!(built.rows, 5);
}

#[test]
fn test_error_display() {
    let err = Error::EngineUnavailable {
        operation: "select".to_string(),
        cause: "connect error".to_string(),
    };
    assert!(err.is_transient());
    assert!(err.to_string().contains("select"));

    let err = Error::EngineError {
        operation: "select".to_string(),
        status: 400,
        body: "undefined field foo".to_string(),
    };
    assert!(!err.is_transient());
    assert!(err.to_string().contains("400"));
}
