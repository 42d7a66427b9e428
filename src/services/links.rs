//! Link targets for pagination and filter toggles.

use super::params::escape_key_segment;
use crate::models::{FilterSet, FilterValue};
use url::form_urlencoded::Serializer;

/// Path used when no other path is set.
pub const DEFAULT_SEARCH_PATH: &str = "/search";

/// Query parameters every pagination and filter link carries forward.
///
/// `filters` and `per_page` are only carried when the incoming request
/// supplied them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseHref {
    /// Link path.
    pub path: String,
    /// Query text as given.
    pub q: Option<String>,
    /// Active filters, when any are set.
    pub filters: Option<FilterSet>,
    /// Explicit rows-per-page.
    pub per_page: Option<u32>,
}

impl BaseHref {
    /// Creates a base on [`DEFAULT_SEARCH_PATH`]. Empty filters are not carried.
    #[must_use]
    pub fn new(q: Option<String>, filters: FilterSet, per_page: Option<u32>) -> Self {
        Self {
            path: DEFAULT_SEARCH_PATH.to_string(),
            q,
            filters: (!filters.is_empty()).then_some(filters),
            per_page,
        }
    }

    /// Replaces the link path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Link without a page number.
    #[must_use]
    pub fn href(&self) -> String {
        self.render(self.filters.as_ref(), None)
    }

    /// Link to page `page` with the current filters.
    #[must_use]
    pub fn page_href(&self, page: u64) -> String {
        self.render(self.filters.as_ref(), Some(page))
    }

    /// Link to the first page with `filters` replacing the current filters.
    #[must_use]
    pub fn filters_href(&self, filters: &FilterSet) -> String {
        self.render(Some(filters), None)
    }

    fn render(&self, filters: Option<&FilterSet>, page: Option<u64>) -> String {
        let mut query = Serializer::new(String::new());
        if let Some(q) = &self.q {
            query.append_pair("q", q);
        }
        for (field, value) in filters.into_iter().flat_map(FilterSet::iter) {
            let field = escape_key_segment(field);
            match value {
                FilterValue::Single(v) => {
                    query.append_pair(&format!("filters[{field}]"), v);
                },
                FilterValue::Multi(values) => {
                    let key = format!("filters[{field}][]");
                    for v in values {
                        query.append_pair(&key, v);
                    }
                },
                FilterValue::Other(serde_json::Value::String(v)) => {
                    query.append_pair(&format!("filters[{field}]"), v);
                },
                FilterValue::Other(v) => {
                    query.append_pair(&format!("filters[{field}]"), &v.to_string());
                },
            }
        }
        if let Some(per_page) = self.per_page {
            query.append_pair("per_page", &per_page.to_string());
        }
        if let Some(page) = page {
            query.append_pair("page", &page.to_string());
        }

        let query = query.finish();
        if query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{query}", self.path)
        }
    }
}

impl Default for BaseHref {
    fn default() -> Self {
        Self::new(None, FilterSet::new(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchDefaults;
    use crate::services::params::{RawParams, normalize};

    #[test]
    fn test_page_href() {
        let base = BaseHref::new(
            Some("red shoes".to_string()),
            FilterSet::new().with("status", "open"),
            None,
        );
        assert_eq!(
            base.page_href(2),
            "/search?q=red+shoes&filters%5Bstatus%5D=open&page=2"
        );
    }

    #[test]
    fn test_empty_base() {
        assert_eq!(BaseHref::default().page_href(1), "/search?page=1");
        assert_eq!(
            BaseHref::default().filters_href(&FilterSet::new()),
            "/search"
        );
    }

    #[test]
    fn test_multi_values_use_list_keys() {
        let base = BaseHref::default().with_path("/catalog");
        let href = base.filters_href(&FilterSet::new().with("tag", vec!["b", "a"]));
        assert_eq!(
            href,
            "/catalog?filters%5Btag%5D%5B%5D=b&filters%5Btag%5D%5B%5D=a"
        );
    }

    #[test]
    fn test_per_page_carried() {
        let base = BaseHref::new(None, FilterSet::new(), Some(50));
        assert_eq!(base.page_href(3), "/search?per_page=50&page=3");
    }

    #[test]
    fn test_href_round_trips_through_normalize() {
        let filters = FilterSet::new()
            .with("tag", vec!["a & b", "c"])
            .with("price", "[10 TO 20]")
            .with("status", "open");
        let base = BaseHref::new(Some("q=1?".to_string()), filters.clone(), Some(10));

        let href = base.page_href(4);
        let normalized = normalize(&RawParams::from_query_str(&href), &SearchDefaults::default());
        assert_eq!(normalized.options.filters, filters);
        assert_eq!(normalized.options.page, 4);
        assert_eq!(normalized.options.per_page, 10);
        assert_eq!(normalized.options.query.as_deref(), Some("q=1?"));
        assert_eq!(normalized.base_href, base);
    }

    #[test]
    fn test_bracketed_field_names_round_trip() {
        let filters = FilterSet::new()
            .with("range[min]", "10")
            .with("we]ird%5D", vec!["x"])
            .with("status", "open");
        let base = BaseHref::new(None, filters.clone(), None);

        let href = base.filters_href(&filters);
        assert!(href.starts_with("/search?filters%5Brange%255Bmin%255D%5D=10&"));
        let normalized = normalize(&RawParams::from_query_str(&href), &SearchDefaults::default());
        assert_eq!(normalized.options.filters, filters);
        let fields: Vec<&str> = normalized.options.filters.iter().map(|(f, _)| f).collect();
        assert_eq!(fields, vec!["range[min]", "we]ird%5D", "status"]);
    }
}
