//! Filter toggle state.
//!
//! Pure functions deciding whether a clicked facet value is active and what
//! the filter set becomes after toggling it. Inputs are never mutated.
//!
//! A single-valued field is either unset or set to one value. Clicking a
//! different value on a set single-valued field does nothing; the user has to
//! remove the current value first. A multi-valued field holds a set that
//! grows and shrinks one member per toggle.

use crate::models::{FilterSet, FilterTerm, FilterValue, ValueSet};

/// What a toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    /// The value was active and has been removed.
    Removed,
    /// The value was inactive and has been added.
    Added,
    /// A single-valued field already holds another value.
    Blocked,
}

/// Result of [`toggle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toggle {
    /// Filter set after the toggle.
    pub filters: FilterSet,
    /// What happened.
    pub action: ToggleAction,
}

impl Toggle {
    /// Returns true if the value was active before the toggle.
    #[must_use]
    pub const fn was_active(&self) -> bool {
        matches!(self.action, ToggleAction::Removed)
    }

    /// Splits into the new filters and the was-active flag.
    #[must_use]
    pub fn into_parts(self) -> (FilterSet, bool) {
        let was_active = self.was_active();
        (self.filters, was_active)
    }
}

/// Returns true if `value` is currently applied to `field`.
///
/// - multi-valued: the field holds a set containing the value
/// - single-valued: the field holds exactly the value
/// - `Flag(true)` is active whenever the field is set to anything truthy
#[must_use]
pub fn is_active(filters: &FilterSet, field: &str, value: &FilterTerm, multivalued: bool) -> bool {
    let Some(current) = filters.get(field).filter(|v| v.is_truthy()) else {
        return false;
    };

    match value {
        FilterTerm::Flag(true) => true,
        FilterTerm::Flag(false) => false,
        FilterTerm::Text(text) => match current {
            FilterValue::Single(s) => !multivalued && s == text,
            FilterValue::Multi(set) => multivalued && set.contains(text),
            FilterValue::Other(_) => false,
        },
    }
}

/// Toggles `value` on `field`, returning a new filter set.
#[must_use]
pub fn toggle(filters: &FilterSet, field: &str, value: &FilterTerm, multivalued: bool) -> Toggle {
    let mut next = filters.clone();

    if is_active(filters, field, value, multivalued) {
        remove_value(&mut next, field, value);
        return Toggle {
            filters: next,
            action: ToggleAction::Removed,
        };
    }

    let occupied = filters.get(field).is_some_and(FilterValue::is_truthy);
    if occupied && !multivalued {
        return Toggle {
            filters: next,
            action: ToggleAction::Blocked,
        };
    }

    add_value(&mut next, field, value, multivalued);
    Toggle {
        filters: next,
        action: ToggleAction::Added,
    }
}

fn remove_value(filters: &mut FilterSet, field: &str, value: &FilterTerm) {
    if let (Some(FilterValue::Multi(set)), FilterTerm::Text(text)) = (filters.get_mut(field), value)
    {
        set.remove(text);
        if !set.is_empty() {
            return;
        }
    }
    filters.remove(field);
}

fn add_value(filters: &mut FilterSet, field: &str, value: &FilterTerm, multivalued: bool) {
    let text = match value {
        FilterTerm::Flag(flag) => {
            filters.insert(field, *flag);
            return;
        },
        FilterTerm::Text(text) => text.clone(),
    };

    if !multivalued {
        filters.insert(field, FilterValue::Single(text));
        return;
    }

    if let Some(FilterValue::Multi(set)) = filters.get_mut(field) {
        set.insert(text);
        return;
    }
    let mut set: ValueSet = match filters.get(field) {
        Some(FilterValue::Single(existing)) => std::iter::once(existing.clone()).collect(),
        Some(FilterValue::Multi(_) | FilterValue::Other(_)) | None => ValueSet::new(),
    };
    set.insert(text);
    filters.insert(field, FilterValue::Multi(set));
}
