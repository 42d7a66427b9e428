//! Raw request parameters and their normalization.
//!
//! Query strings arrive as a loosely typed bag (`filters[tag][]=a`,
//! `page=2`, `lucene=0`). [`normalize`] runs once per request and turns
//! that bag into [`SearchOptions`], so the builder never has to coerce types.

use super::links::BaseHref;
use crate::config::SearchDefaults;
use crate::models::{FilterSet, FilterValue, SearchOptions, is_blank_str};
use std::borrow::Cow;

/// A raw parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// Plain text.
    Text(String),
    /// Repeated `key[]` values.
    List(Vec<String>),
    /// Coerced boolean.
    Flag(bool),
    /// Nested `key[sub]` parameters.
    Map(RawParams),
}

impl ParamValue {
    /// Returns the text of a `Text` value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true unless absent-like: blank text, `"0"`, `"false"`,
    /// `false`, or an empty list or map.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Text(s) => !is_blank_str(s) && s != "0" && !s.eq_ignore_ascii_case("false"),
            Self::List(items) => !items.is_empty(),
            Self::Flag(flag) => *flag,
            Self::Map(map) => !map.is_empty(),
        }
    }

    /// Returns the value as a list of strings (text yields one element).
    #[must_use]
    pub fn to_list(&self) -> Vec<String> {
        match self {
            Self::Text(s) => vec![s.clone()],
            Self::List(items) => items.clone(),
            Self::Flag(_) | Self::Map(_) => Vec::new(),
        }
    }

    fn to_filter_value(&self) -> FilterValue {
        match self {
            Self::Text(s) => FilterValue::Single(s.clone()),
            Self::List(items) => FilterValue::multi(items.iter().cloned()),
            Self::Flag(flag) => FilterValue::from(*flag),
            Self::Map(map) => FilterValue::Other(map.to_json()),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::List(items) => serde_json::Value::from(items.clone()),
            Self::Flag(flag) => serde_json::Value::Bool(*flag),
            Self::Map(map) => map.to_json(),
        }
    }
}

/// Ordered, string-keyed parameter bag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawParams {
    entries: Vec<(String, ParamValue)>,
}

impl RawParams {
    /// Creates an empty bag.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Parses a URL query string; a leading path and `?` are skipped.
    ///
    /// Bracket keys nest: `filters[tag][]=a` appends to the `tag` list
    /// inside the `filters` map, `filters[status]=open` sets text.
    #[must_use]
    pub fn from_query_str(query: &str) -> Self {
        let query = query.split_once('?').map_or(query, |(_, q)| q);
        let mut params = Self::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let segments = key_segments(&key);
            if segments.is_empty() {
                continue;
            }
            let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
            params.insert_path(&segments, value.into_owned());
        }
        params
    }

    /// Sets a value, replacing any previous value for the key in place.
    pub fn set(&mut self, key: impl Into<String>, value: ParamValue) {
        let key = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Sets a text value.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, ParamValue::Text(value.into()));
        self
    }

    /// Returns the value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Removes a key.
    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns true if the bag is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the text of a key.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ParamValue::as_text)
    }

    /// Returns true if the key is present and truthy.
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(ParamValue::is_truthy)
    }

    fn parsed<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.text(key).and_then(|s| s.trim().parse().ok())
    }

    fn insert_path(&mut self, segments: &[&str], value: String) {
        match segments {
            [] => {},
            [name] => self.set(*name, ParamValue::Text(value)),
            [name, ""] => {
                let slot = self.get_mut_or(name, || ParamValue::List(Vec::new()));
                if let ParamValue::List(items) = slot {
                    items.push(value);
                    return;
                }
                // `key=a&key[]=b` keeps both values
                let items = match std::mem::replace(slot, ParamValue::Flag(false)) {
                    ParamValue::Text(existing) => vec![existing, value],
                    _ => vec![value],
                };
                *slot = ParamValue::List(items);
            },
            [name, rest @ ..] => match self.get_mut_or(name, || ParamValue::Map(Self::new())) {
                ParamValue::Map(map) => map.insert_path(rest, value),
                other => {
                    let mut map = Self::new();
                    map.insert_path(rest, value);
                    *other = ParamValue::Map(map);
                },
            },
        }
    }

    fn get_mut_or(&mut self, key: &str, init: impl FnOnce() -> ParamValue) -> &mut ParamValue {
        let index = if let Some(index) = self.entries.iter().position(|(k, _)| k == key) {
            index
        } else {
            self.entries.push((key.to_string(), init()));
            self.entries.len() - 1
        };
        &mut self.entries[index].1
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    /// Turns every top-level `"0"` into `Flag(false)`; nested maps are untouched.
    fn coerce_zero_flags(&mut self) {
        for (_, value) in &mut self.entries {
            if matches!(value, ParamValue::Text(s) if s == "0") {
                *value = ParamValue::Flag(false);
            }
        }
    }
}

/// Splits `filters[tag][]` into `["filters", "tag", ""]`, unescaping each
/// segment.
fn key_segments(key: &str) -> Vec<String> {
    let Some(open) = key.find('[') else {
        return if key.is_empty() {
            Vec::new()
        } else {
            vec![unescape_key_segment(key)]
        };
    };
    let mut segments = vec![unescape_key_segment(&key[..open])];
    let mut rest = &key[open..];
    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(close) = stripped.find(']') else {
            break;
        };
        segments.push(unescape_key_segment(&stripped[..close]));
        rest = &stripped[close + 1..];
    }
    segments
}

/// Escapes `%`, `[` and `]` in a key segment so names holding brackets
/// survive [`RawParams::from_query_str`].
pub(crate) fn escape_key_segment(segment: &str) -> Cow<'_, str> {
    if !segment.contains(['%', '[', ']']) {
        return Cow::Borrowed(segment);
    }
    let mut escaped = String::with_capacity(segment.len() + 4);
    for c in segment.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            '[' => escaped.push_str("%5B"),
            ']' => escaped.push_str("%5D"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

fn unescape_key_segment(segment: &str) -> String {
    let mut unescaped = String::with_capacity(segment.len());
    let mut rest = segment;
    while let Some(index) = rest.find('%') {
        unescaped.push_str(&rest[..index]);
        let tail = &rest[index..];
        let decoded = match tail.get(1..3) {
            Some(code) if code.eq_ignore_ascii_case("25") => Some('%'),
            Some(code) if code.eq_ignore_ascii_case("5B") => Some('['),
            Some(code) if code.eq_ignore_ascii_case("5D") => Some(']'),
            _ => None,
        };
        if let Some(c) = decoded {
            unescaped.push(c);
            rest = &tail[3..];
        } else {
            unescaped.push('%');
            rest = &tail[1..];
        }
    }
    unescaped.push_str(rest);
    unescaped
}

/// Response format selected by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    /// Derived facets, pagination and links for a view layer.
    #[default]
    Html,
    /// The engine's response verbatim.
    Json,
}

impl ResponseFormat {
    /// Parses `json`; anything else is `Html`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Html
        }
    }
}

/// The outcome of [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRequest {
    /// Options for the request builder.
    pub options: SearchOptions,
    /// Requested response format.
    pub format: ResponseFormat,
    /// Base for pagination and filter links.
    pub base_href: BaseHref,
}

/// Normalizes raw parameters into search options.
///
/// Steps, in order: drop `filters` when `reset_filters` is truthy, prune
/// blank filters, coerce top-level `"0"` to `false`, then read typed values
/// with defaults.
#[must_use]
pub fn normalize(raw: &RawParams, defaults: &SearchDefaults) -> NormalizedRequest {
    let filters = if raw.flag("reset_filters") {
        FilterSet::new()
    } else {
        match raw.get("filters") {
            Some(ParamValue::Map(map)) => map
                .iter()
                .map(|(k, v)| (k, v.to_filter_value()))
                .collect::<FilterSet>()
                .without_blank(),
            _ => FilterSet::new(),
        }
    };

    let mut params = raw.clone();
    params.coerce_zero_flags();

    let explicit_per_page = params.parsed::<u32>("per_page").filter(|n| *n > 0);
    let per_page = explicit_per_page.unwrap_or(defaults.per_page).max(1);
    let page = params.parsed::<u32>("page").unwrap_or(1).max(1);
    let query = params.text("q").map(ToString::to_string);

    let options = SearchOptions {
        query: query.clone(),
        filters: filters.clone(),
        page,
        per_page,
        sort: params
            .text("sort")
            .filter(|s| !is_blank_str(s))
            .map(ToString::to_string),
        use_literal_parser: params.flag("lucene"),
        facet: params.flag("facet"),
        facet_fields: list_param(&params, "facet.field"),
        facet_limit: params.parsed("facet.limit"),
        facet_min_count: params.parsed("facet.mincount"),
        group: params.flag("group"),
        group_field: params
            .text("group.field")
            .filter(|s| !is_blank_str(s))
            .map(ToString::to_string),
        group_limit: params.parsed("group.limit"),
        explicit_filter_queries: params.get("fq").map(ParamValue::to_list),
        phrase_fields: params.get("pf").map(|v| match v {
            ParamValue::Text(s) => s.split_whitespace().map(ToString::to_string).collect(),
            other => other.to_list(),
        }),
        phrase_slop: params.parsed("ps"),
        minimum_match: params.text("mm").map(ToString::to_string),
        boost_queries: params.get("bq").map(ParamValue::to_list),
        start: params.parsed("start"),
    };

    let format = params
        .text("format")
        .map(ResponseFormat::parse)
        .unwrap_or_default();

    let base_href = BaseHref::new(query, filters, explicit_per_page);

    NormalizedRequest {
        options,
        format,
        base_href,
    }
}

fn list_param(params: &RawParams, key: &str) -> Vec<String> {
    params
        .get(key)
        .map(ParamValue::to_list)
        .unwrap_or_default()
        .into_iter()
        .filter(|s| !is_blank_str(s))
        .collect()
}
