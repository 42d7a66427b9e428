//! View state for facet lists, active filters and pagination.
//!
//! Nothing here renders markup; each function returns the labels and link
//! targets a template needs.

use super::filter_state::{ToggleAction, toggle};
use super::links::BaseHref;
use crate::models::{FacetField, FacetMap, FilterSet, FilterTerm, FilterValue, PaginationState};
use serde::Serialize;

/// Facet lists longer than this are marked scrollable.
pub const SCROLLABLE_AFTER: usize = 5;

/// A clickable facet value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterLink {
    /// The value is active; following `href` removes it.
    Remove {
        /// Display label.
        label: String,
        /// Link without the value.
        href: String,
    },
    /// The value is inactive; following `href` applies it.
    Add {
        /// Display label.
        label: String,
        /// Link with the value.
        href: String,
    },
}

impl FilterLink {
    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Remove { label, .. } | Self::Add { label, .. } => label,
        }
    }

    /// Returns the link target.
    #[must_use]
    pub fn href(&self) -> &str {
        match self {
            Self::Remove { href, .. } | Self::Add { href, .. } => href,
        }
    }

    /// Returns true for a remove link.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Remove { .. })
    }
}

/// Turns a field name into a heading: `record_type` becomes `Record Type`.
#[must_use]
pub fn facet_heading(field: &str) -> String {
    field
        .replace('_', " ")
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
    })
}

/// Builds the link for one facet value.
///
/// Returns `None` when a single-valued field already holds another value.
#[must_use]
pub fn filter_link(
    filters: &FilterSet,
    base: &BaseHref,
    field: &str,
    value: &FilterTerm,
    label: Option<&str>,
    multivalued: bool,
) -> Option<FilterLink> {
    let result = toggle(filters, field, value, multivalued);
    let label = label.map_or_else(|| value.label(), ToString::to_string);
    match result.action {
        ToggleAction::Removed => Some(FilterLink::Remove {
            label,
            href: base.filters_href(&result.filters),
        }),
        ToggleAction::Added => Some(FilterLink::Add {
            label,
            href: base.filters_href(&result.filters),
        }),
        ToggleAction::Blocked => None,
    }
}

/// One facet with its value links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetGroup {
    /// Field name.
    pub field: String,
    /// Display heading.
    pub heading: String,
    /// More than [`SCROLLABLE_AFTER`] values.
    pub scrollable: bool,
    /// Value links with counts, in engine order.
    pub links: Vec<(FilterLink, u64)>,
}

/// Builds facet groups in response order, skipping ignored, empty and
/// structured facets.
#[must_use]
pub fn facet_options(
    facets: &FacetMap,
    filters: &FilterSet,
    base: &BaseHref,
    ignore: &[&str],
) -> Vec<FacetGroup> {
    facets
        .iter()
        .filter(|(field, _)| !ignore.contains(field))
        .filter_map(|(field, facet)| {
            let FacetField::Counts(counts) = facet else {
                return None;
            };
            if counts.is_empty() {
                return None;
            }
            let links = counts
                .iter()
                .filter_map(|(value, count)| {
                    let term = FilterTerm::from(value.as_str());
                    filter_link(filters, base, field, &term, None, true).map(|l| (l, *count))
                })
                .collect();
            Some(FacetGroup {
                field: field.to_string(),
                heading: facet_heading(field),
                scrollable: counts.len() > SCROLLABLE_AFTER,
                links,
            })
        })
        .collect()
}

/// One remove link per active filter value, in filter order.
#[must_use]
pub fn active_filters(filters: &FilterSet, base: &BaseHref) -> Vec<FilterLink> {
    let mut links = Vec::new();
    for (field, value) in filters.iter().filter(|(_, v)| v.is_truthy()) {
        let terms: Vec<FilterTerm> = match value {
            FilterValue::Single(v) => vec![FilterTerm::from(v.as_str())],
            FilterValue::Multi(values) => values
                .iter()
                .map(|v| FilterTerm::from(v.as_str()))
                .collect(),
            FilterValue::Other(_) => vec![FilterTerm::Flag(true)],
        };
        let multivalued = matches!(value, FilterValue::Multi(_));
        links.extend(
            terms
                .iter()
                .filter_map(|term| filter_link(filters, base, field, term, None, multivalued)),
        );
    }
    links
}

/// A numbered pagination link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLink {
    /// Page number.
    pub number: u64,
    /// Link target.
    pub href: String,
    /// True for the current page.
    pub current: bool,
}

/// Pagination links for the current window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLinks {
    /// Link to the unpaged search; `None` when the window starts at page 1.
    pub first: Option<String>,
    /// Numbered links.
    pub pages: Vec<PageLink>,
    /// Link to the last page; `None` when the window reaches it.
    pub last: Option<String>,
}

impl PageLinks {
    /// Builds links for `state`.
    #[must_use]
    pub fn new(state: &PaginationState, base: &BaseHref) -> Self {
        let pages = state
            .window()
            .map(|number| PageLink {
                number,
                href: base.page_href(number),
                current: number == state.current_page,
            })
            .collect();
        Self {
            first: (state.window_start != 1).then(|| base.href()),
            pages,
            last: (state.window_end != state.total_pages)
                .then(|| base.page_href(state.total_pages)),
        }
    }
}

/// Returns pagination links, or `None` for a single page of results.
#[must_use]
pub fn render_pagination(state: &PaginationState, base: &BaseHref) -> Option<PageLinks> {
    state
        .has_multiple_pages()
        .then(|| PageLinks::new(state, base))
}
