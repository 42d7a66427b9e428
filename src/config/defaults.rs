//! Query-field boosts and per-request defaults.

/// A searchable field with an optional boost weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryField {
    /// Field name.
    pub name: String,
    /// Boost weight, rendered as `name^boost`.
    pub boost: Option<u32>,
}

impl QueryField {
    /// Creates a boosted field.
    #[must_use]
    pub fn boosted(name: impl Into<String>, boost: u32) -> Self {
        Self {
            name: name.into(),
            boost: Some(boost),
        }
    }

    /// Creates a field without a boost.
    #[must_use]
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            boost: None,
        }
    }

    /// Parses `name` or `name^boost`. Unparsable boosts are dropped.
    #[must_use]
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return None;
        }
        match spec.split_once('^') {
            Some((name, boost)) => Some(Self {
                name: name.trim().to_string(),
                boost: boost.trim().parse().ok(),
            }),
            None => Some(Self::plain(spec)),
        }
    }
}

/// Default query fields: `title^1000 description^500`.
#[must_use]
pub fn default_query_fields() -> Vec<QueryField> {
    vec![
        QueryField::boosted("title", 1000),
        QueryField::boosted("description", 500),
    ]
}

/// Defaults applied when a request leaves a parameter unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchDefaults {
    /// Rows per page.
    pub per_page: u32,
    /// Minimum-match spec.
    pub minimum_match: String,
    /// Phrase slop.
    pub phrase_slop: u32,
    /// Facet values per field (`-1` = no cap).
    pub facet_limit: i64,
    /// Minimum facet count.
    pub facet_min_count: u32,
    /// Documents per group.
    pub group_limit: u32,
    /// Response writer requested from the engine.
    pub response_format: String,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            per_page: crate::models::DEFAULT_PER_PAGE,
            minimum_match: "2<75%".to_string(),
            phrase_slop: 3,
            facet_limit: -1,
            facet_min_count: 1,
            group_limit: 5,
            response_format: "json".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_field() {
        assert_eq!(
            QueryField::parse("title^1000"),
            Some(QueryField::boosted("title", 1000))
        );
        assert_eq!(QueryField::parse("body"), Some(QueryField::plain("body")));
        assert_eq!(QueryField::parse("body^x"), Some(QueryField::plain("body")));
        assert_eq!(QueryField::parse("  "), None);
    }

    #[test]
    fn test_default_values() {
        let defaults = SearchDefaults::default();
        assert_eq!(defaults.per_page, 20);
        assert_eq!(defaults.minimum_match, "2<75%");
        assert_eq!(defaults.phrase_slop, 3);
        assert_eq!(defaults.facet_limit, -1);
        assert_eq!(defaults.facet_min_count, 1);
        assert_eq!(defaults.group_limit, 5);
    }
}
