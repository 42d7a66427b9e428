//! Search request construction.
//!
//! Translates [`SearchOptions`] into a [`SearchRequest`]. Building never
//! fails: malformed input is normalized rather than rejected.
//!
//! # Filter serialization
//!
//! | Filter value | Filter query |
//! |--------------|--------------|
//! | `"[10 TO 20]"` (leading `[`) | `price: [10 TO 20]` (range, unquoted) |
//! | `"open"` | `status: "open"` |
//! | `""` or whitespace | omitted |
//! | `{"a", "b"}` | `tag: "a"`, `tag: "b"` (one clause per member) |
//! | anything else | `flag: false` (unquoted literal) |
//!
//! A multi-valued selection produces one `fq` clause per member. The engine
//! intersects separate `fq` clauses, so several members of one field narrow
//! the result rather than widen it.

use crate::config::{QueryField, SearchConfig};
use crate::models::{
    FacetDirective, FilterSet, FilterValue, GroupDirective, QueryParser, SearchOptions,
    SearchRequest, is_blank_str,
};

/// `q.alt` used by the extended parser when no query text is given.
pub const MATCH_ALL: &str = "*:*";

/// Builds engine requests from search options.
#[derive(Debug, Clone, Copy)]
pub struct SearchRequestBuilder<'a> {
    config: &'a SearchConfig,
}

impl<'a> SearchRequestBuilder<'a> {
    /// Creates a builder over the given configuration.
    #[must_use]
    pub const fn new(config: &'a SearchConfig) -> Self {
        Self { config }
    }

    /// Builds the request for `options`.
    #[must_use]
    pub fn build(&self, options: &SearchOptions) -> SearchRequest {
        let defaults = &self.config.defaults;
        let mut request = SearchRequest {
            response_format: defaults.response_format.clone(),
            parser: QueryParser::Extended,
            query: None,
            query_alt: None,
            query_fields: None,
            phrase_fields: None,
            phrase_slop: None,
            minimum_match: None,
            boost_queries: None,
            group: None,
            facet: None,
            filter_queries: Vec::new(),
            start: options.start(),
            rows: options.per_page.max(1),
            sort: options.sort.clone().filter(|s| !is_blank_str(s)),
        };

        if options.use_literal_parser {
            request.parser = QueryParser::Literal;
            request.query.clone_from(&options.query);
        } else {
            self.apply_extended(options, &mut request);
        }

        request.filter_queries = options
            .explicit_filter_queries
            .clone()
            .unwrap_or_else(|| build_filter_queries(&options.filters));

        tracing::debug!(
            parser = request.parser.as_str(),
            start = request.start,
            rows = request.rows,
            filter_queries = request.filter_queries.len(),
            "Built search request"
        );

        request
    }

    fn apply_extended(&self, options: &SearchOptions, request: &mut SearchRequest) {
        let defaults = &self.config.defaults;

        request.query_alt = Some(MATCH_ALL.to_string());
        request.query = options.query_text().map(ToString::to_string);

        if options.group {
            if let Some(field) = &options.group_field {
                request.group = Some(GroupDirective {
                    field: field.clone(),
                    limit: options.group_limit.unwrap_or(defaults.group_limit),
                });
            }
        }

        request.query_fields = Some(query_fields_param(&self.config.query_fields));

        if options.facet && !options.facet_fields.is_empty() {
            request.facet = Some(FacetDirective {
                fields: options.facet_fields.clone(),
                limit: options.facet_limit.unwrap_or(defaults.facet_limit),
                min_count: options.facet_min_count.unwrap_or(defaults.facet_min_count),
            });
        }

        request.boost_queries = Some(options.boost_queries.clone().unwrap_or_default());
        request.minimum_match = Some(
            options
                .minimum_match
                .clone()
                .unwrap_or_else(|| defaults.minimum_match.clone()),
        );
        request.phrase_fields = Some(options.phrase_fields.clone().unwrap_or_else(|| {
            self.config
                .query_fields
                .iter()
                .map(|f| f.name.clone())
                .collect()
        }));
        request.phrase_slop = Some(options.phrase_slop.unwrap_or(defaults.phrase_slop));
    }
}

/// Renders the `qf` parameter: `title^1000 description^500`.
#[must_use]
pub fn query_fields_param(fields: &[QueryField]) -> String {
    let mut qf = String::new();
    for field in fields {
        qf.push(' ');
        qf.push_str(&field.name);
        if let Some(boost) = field.boost {
            qf.push('^');
            qf.push_str(&boost.to_string());
        }
    }
    qf.trim().to_string()
}

/// Serializes a filter set into filter-query clauses, in filter insertion order.
#[must_use]
pub fn build_filter_queries(filters: &FilterSet) -> Vec<String> {
    let mut fq = Vec::new();
    for (field, value) in filters.iter() {
        match value {
            FilterValue::Single(v) if v.starts_with('[') => fq.push(format!("{field}: {v}")),
            FilterValue::Single(v) if !is_blank_str(v) => fq.push(format!("{field}: \"{v}\"")),
            FilterValue::Single(_) => {},
            FilterValue::Multi(values) => fq.extend(
                values
                    .iter()
                    .filter(|v| !is_blank_str(v))
                    .map(|v| format!("{field}: \"{v}\"")),
            ),
            FilterValue::Other(v) => fq.push(format!("{field}: {}", literal(v))),
        }
    }
    fq
}

/// Renders a JSON value without string quoting.
fn literal(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
