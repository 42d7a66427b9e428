//! Search options supplied by the caller.

use super::FilterSet;

/// Default number of rows per page.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Per-request search options.
///
/// Absent overrides fall back to [`crate::config::SearchDefaults`] when the
/// request is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// Free-text query; blank or absent matches everything.
    pub query: Option<String>,
    /// Active facet filters.
    pub filters: FilterSet,
    /// One-based page number.
    pub page: u32,
    /// Rows per page.
    pub per_page: u32,
    /// Sort spec such as `"title asc"`; absent means relevance order.
    pub sort: Option<String>,
    /// Use the literal (standard Lucene) grammar instead of the extended parser.
    pub use_literal_parser: bool,
    /// Request facet counts.
    pub facet: bool,
    /// Fields to facet on.
    pub facet_fields: Vec<String>,
    /// Facet value cap; `-1` is unbounded.
    pub facet_limit: Option<i64>,
    /// Minimum count for a facet value to be returned.
    pub facet_min_count: Option<u32>,
    /// Request result grouping.
    pub group: bool,
    /// Field to group on.
    pub group_field: Option<String>,
    /// Documents returned per group.
    pub group_limit: Option<u32>,
    /// Filter queries used verbatim instead of serializing `filters`.
    pub explicit_filter_queries: Option<Vec<String>>,
    /// Phrase-field override.
    pub phrase_fields: Option<Vec<String>>,
    /// Phrase-slop override.
    pub phrase_slop: Option<u32>,
    /// Minimum-match override.
    pub minimum_match: Option<String>,
    /// Boost queries.
    pub boost_queries: Option<Vec<String>>,
    /// Explicit start offset, bypassing the page computation.
    pub start: Option<u64>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            query: None,
            filters: FilterSet::new(),
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            sort: None,
            use_literal_parser: false,
            facet: false,
            facet_fields: Vec::new(),
            facet_limit: None,
            facet_min_count: None,
            group: false,
            group_field: None,
            group_limit: None,
            explicit_filter_queries: None,
            phrase_fields: None,
            phrase_slop: None,
            minimum_match: None,
            boost_queries: None,
            start: None,
        }
    }
}

impl SearchOptions {
    /// Creates options that match all documents on the first page.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the query text.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Replaces the filter set.
    #[must_use]
    pub fn with_filters(mut self, filters: FilterSet) -> Self {
        self.filters = filters;
        self
    }

    /// Sets the page, coerced to at least 1.
    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Sets rows per page, coerced to at least 1.
    #[must_use]
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    /// Sets the sort spec.
    #[must_use]
    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// Switches to the literal query grammar.
    #[must_use]
    pub const fn literal(mut self) -> Self {
        self.use_literal_parser = true;
        self
    }

    /// Requests facet counts for the given fields.
    #[must_use]
    pub fn with_facets<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.facet = true;
        self.facet_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Requests grouping on a field.
    #[must_use]
    pub fn with_group(mut self, field: impl Into<String>) -> Self {
        self.group = true;
        self.group_field = Some(field.into());
        self
    }

    /// Supplies filter queries verbatim.
    #[must_use]
    pub fn with_filter_queries(mut self, fq: Vec<String>) -> Self {
        self.explicit_filter_queries = Some(fq);
        self
    }

    /// Offset of the first row: `(page - 1) * per_page` unless overridden.
    #[must_use]
    pub fn start(&self) -> u64 {
        self.start.unwrap_or_else(|| {
            u64::from(self.page.max(1) - 1) * u64::from(self.per_page.max(1))
        })
    }

    /// Returns the query text when it is not blank.
    #[must_use]
    pub fn query_text(&self) -> Option<&str> {
        self.query
            .as_deref()
            .filter(|q| !super::filter::is_blank_str(q))
    }
}
