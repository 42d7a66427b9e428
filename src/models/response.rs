//! Engine responses and the views derived from them.

use serde::Serialize;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Facet results for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FacetField {
    /// `(value, count)` pairs in engine order.
    Counts(Vec<(String, u64)>),
    /// A structured facet (ranges, dates) passed through untouched.
    Structured(serde_json::Value),
}

impl FacetField {
    /// Returns the value counts for list facets.
    #[must_use]
    pub fn counts(&self) -> Option<&[(String, u64)]> {
        match self {
            Self::Counts(pairs) => Some(pairs),
            Self::Structured(_) => None,
        }
    }

    /// Returns the count for one value.
    #[must_use]
    pub fn count(&self, value: &str) -> Option<u64> {
        self.counts()?
            .iter()
            .find(|(v, _)| v == value)
            .map(|(_, c)| *c)
    }

    /// Returns true if the facet has nothing to show.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Counts(pairs) => pairs.is_empty(),
            Self::Structured(value) => match value {
                serde_json::Value::Null => true,
                serde_json::Value::Object(map) => map.is_empty(),
                serde_json::Value::Array(items) => items.is_empty(),
                _ => false,
            },
        }
    }
}

/// Facet field to value counts, in response order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FacetMap {
    fields: Vec<(String, FacetField)>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
}

impl FacetMap {
    /// Creates an empty facet map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field, replacing an earlier entry with the same name in place.
    pub fn insert(&mut self, field: impl Into<String>, facet: FacetField) {
        match self.positions.entry(field.into()) {
            Entry::Occupied(slot) => self.fields[*slot.get()].1 = facet,
            Entry::Vacant(slot) => {
                self.fields.push((slot.key().clone(), facet));
                slot.insert(self.fields.len() - 1);
            },
        }
    }

    /// Returns the facet for a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FacetField> {
        self.positions
            .get(field)
            .map(|&index| &self.fields[index].1)
    }

    /// Iterates over fields in response order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FacetField)> {
        self.fields.iter().map(|(name, facet)| (name.as_str(), facet))
    }

    /// Number of facet fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if there are no facet fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Page count and the window of page numbers to display.
///
/// `window_end < window_start` (only when `total_pages == 0`) means there is
/// nothing to paginate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationState {
    /// Total number of pages.
    pub total_pages: u64,
    /// Current one-based page.
    pub current_page: u64,
    /// First page number in the window.
    pub window_start: u64,
    /// Last page number in the window.
    pub window_end: u64,
}

impl PaginationState {
    /// Page numbers inside the window.
    #[must_use]
    pub const fn window(&self) -> std::ops::RangeInclusive<u64> {
        self.window_start..=self.window_end
    }

    /// Returns true if the window holds no pages.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.window_end < self.window_start
    }

    /// Returns true if a page selector is worth rendering.
    #[must_use]
    pub const fn has_multiple_pages(&self) -> bool {
        self.total_pages > 1
    }
}
