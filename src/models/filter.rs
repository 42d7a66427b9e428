//! Filter values and the active filter set.

use serde::{Deserialize, Serialize};

/// Value selected for a single filter field.
///
/// Deserializes from a JSON string, an array of strings, or any other JSON
/// value (booleans, numbers), which lands in [`FilterValue::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// One value; a leading `[` marks a range expression.
    Single(String),
    /// Multi-valued facet selection.
    Multi(ValueSet),
    /// Anything else, rendered verbatim (e.g. `false`).
    Other(serde_json::Value),
}

impl FilterValue {
    /// Creates a single-valued filter.
    #[must_use]
    pub fn single(value: impl Into<String>) -> Self {
        Self::Single(value.into())
    }

    /// Creates a multi-valued filter from the given members, keeping their
    /// order and dropping repeats.
    #[must_use]
    pub fn multi<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Multi(values.into_iter().map(Into::into).collect())
    }

    /// Returns true if the value carries nothing to filter on.
    ///
    /// Blank strings, sets whose members are all blank, `null`, `false`, and
    /// empty JSON strings, arrays or objects are blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Single(value) => is_blank_str(value),
            Self::Multi(values) => values.iter().all(|v| is_blank_str(v)),
            Self::Other(value) => match value {
                serde_json::Value::Null | serde_json::Value::Bool(false) => true,
                serde_json::Value::String(s) => is_blank_str(s),
                serde_json::Value::Array(items) => items.is_empty(),
                serde_json::Value::Object(map) => map.is_empty(),
                _ => false,
            },
        }
    }

    /// Returns true if the value counts as set when checking for active filters.
    #[must_use]
    pub const fn is_truthy(&self) -> bool {
        match self {
            Self::Single(_) | Self::Multi(_) => true,
            Self::Other(value) => !matches!(
                value,
                serde_json::Value::Null | serde_json::Value::Bool(false)
            ),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Other(serde_json::Value::Bool(value))
    }
}

impl From<Vec<&str>> for FilterValue {
    fn from(values: Vec<&str>) -> Self {
        Self::multi(values)
    }
}

/// Members of a multi-valued filter, without duplicates, in the order they
/// were added. Equality ignores order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>")]
pub struct ValueSet(Vec<String>);

impl ValueSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns true if `value` is a member.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|v| v == value)
    }

    /// Appends `value` unless it is already a member; returns true if added.
    pub fn insert(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        if self.contains(&value) {
            return false;
        }
        self.0.push(value);
        true
    }

    /// Removes `value`, keeping the order of the rest; returns true if found.
    pub fn remove(&mut self, value: &str) -> bool {
        let Some(index) = self.0.iter().position(|v| v == value) else {
            return false;
        };
        self.0.remove(index);
        true
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for ValueSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|v| other.contains(v))
    }
}

impl Eq for ValueSet {}

impl From<Vec<String>> for ValueSet {
    fn from(values: Vec<String>) -> Self {
        values.into_iter().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for ValueSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut set = Self::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

impl<'a> IntoIterator for &'a ValueSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Returns true for empty or whitespace-only strings.
#[must_use]
pub fn is_blank_str(value: &str) -> bool {
    value.trim().is_empty()
}

/// A facet value as clicked in the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterTerm {
    /// A textual facet value.
    Text(String),
    /// A boolean switch; `Flag(true)` matches any truthy filter.
    Flag(bool),
}

impl FilterTerm {
    /// Returns the label shown for this term.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Text(value) => value.clone(),
            Self::Flag(value) => value.to_string(),
        }
    }
}

impl From<&str> for FilterTerm {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterTerm {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FilterTerm {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// Active filters keyed by field name, iterated in insertion order.
///
/// Owned per request. Operations that change the selection return a new set.
/// Equality compares fields and values, not their order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "serde_json::Map<String, serde_json::Value>")]
pub struct FilterSet {
    entries: Vec<(String, FilterValue)>,
}

impl FilterSet {
    /// Creates an empty filter set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds a filter, replacing any previous value for the field.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(field, value);
        self
    }

    /// Sets the value for a field. A new field goes last; an existing field
    /// keeps its position.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FilterValue>) {
        let field = field.into();
        let value = value.into();
        match self.get_mut(&field) {
            Some(slot) => *slot = value,
            None => self.entries.push((field, value)),
        }
    }

    /// Removes a field, returning its previous value.
    pub fn remove(&mut self, field: &str) -> Option<FilterValue> {
        let index = self.entries.iter().position(|(k, _)| k == field)?;
        Some(self.entries.remove(index).1)
    }

    /// Returns the value for a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FilterValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == field)
            .map(|(_, v)| v)
    }

    /// Returns a mutable reference to the value for a field.
    pub fn get_mut(&mut self, field: &str) -> Option<&mut FilterValue> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == field)
            .map(|(_, v)| v)
    }

    /// Iterates over `(field, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of filtered fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no filters are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a copy without blank-valued fields.
    #[must_use]
    pub fn without_blank(&self) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(_, v)| !v.is_blank())
                .cloned()
                .collect(),
        }
    }
}

impl PartialEq for FilterSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl Eq for FilterSet {}

impl Serialize for FilterSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl TryFrom<serde_json::Map<String, serde_json::Value>> for FilterSet {
    type Error = serde_json::Error;

    fn try_from(map: serde_json::Map<String, serde_json::Value>) -> Result<Self, Self::Error> {
        map.into_iter()
            .map(|(k, v)| serde_json::from_value::<FilterValue>(v).map(|v| (k, v)))
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for FilterSet
where
    K: Into<String>,
    V: Into<FilterValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut filters = Self::new();
        for (k, v) in iter {
            filters.insert(k, v);
        }
        filters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_values() {
        assert!(FilterValue::single("").is_blank());
        assert!(FilterValue::single("   ").is_blank());
        assert!(!FilterValue::single("open").is_blank());
        assert!(FilterValue::multi(Vec::<String>::new()).is_blank());
        assert!(FilterValue::multi(["", " "]).is_blank());
        assert!(!FilterValue::multi(["", "a"]).is_blank());
        assert!(FilterValue::from(false).is_blank());
        assert!(FilterValue::Other(serde_json::Value::Null).is_blank());
        assert!(!FilterValue::from(true).is_blank());
        assert!(!FilterValue::Other(serde_json::json!(0)).is_blank());
    }

    #[test]
    fn test_truthiness() {
        assert!(FilterValue::single("x").is_truthy());
        assert!(FilterValue::multi(["x"]).is_truthy());
        assert!(FilterValue::from(true).is_truthy());
        assert!(!FilterValue::from(false).is_truthy());
        assert!(!FilterValue::Other(serde_json::Value::Null).is_truthy());
    }

    #[test]
    fn test_without_blank_drops_empty_fields() {
        let filters = FilterSet::new()
            .with("status", "open")
            .with("tag", FilterValue::multi(Vec::<String>::new()))
            .with("owner", "");
        let pruned = filters.without_blank();
        assert_eq!(pruned.len(), 1);
        assert_eq!(pruned.get("status"), Some(&FilterValue::single("open")));
    }

    #[test]
    fn test_deserialize_untagged() {
        let filters: FilterSet =
            serde_json::from_str(r#"{"tag":["b","a"],"price":"[10 TO 20]","archived":false}"#)
                .unwrap();
        assert_eq!(filters.get("tag"), Some(&FilterValue::multi(["a", "b"])));
        assert_eq!(
            filters.get("price"),
            Some(&FilterValue::single("[10 TO 20]"))
        );
        assert_eq!(filters.get("archived"), Some(&FilterValue::from(false)));
    }

    #[test]
    fn test_iteration_follows_insertion() {
        let mut filters = FilterSet::new()
            .with("zeta", "1")
            .with("alpha", "2")
            .with("mid", "3");
        filters.insert("zeta", "4");
        let fields: Vec<&str> = filters.iter().map(|(k, _)| k).collect();
        assert_eq!(fields, vec!["zeta", "alpha", "mid"]);
        assert_eq!(filters.get("zeta"), Some(&FilterValue::single("4")));

        filters.remove("alpha");
        let fields: Vec<&str> = filters.iter().map(|(k, _)| k).collect();
        assert_eq!(fields, vec!["zeta", "mid"]);
    }

    #[test]
    fn test_value_set_keeps_order_and_drops_repeats() {
        let value = FilterValue::multi(["zeta", "alpha", "zeta", "mid"]);
        let members: Vec<&str> = match &value {
            FilterValue::Multi(set) => set.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        };
        assert_eq!(members, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_equality_ignores_order() {
        assert_eq!(FilterValue::multi(["a", "b"]), FilterValue::multi(["b", "a"]));
        assert_ne!(FilterValue::multi(["a", "b"]), FilterValue::multi(["a"]));
        let left = FilterSet::new().with("x", "1").with("y", "2");
        let right = FilterSet::new().with("y", "2").with("x", "1");
        assert_eq!(left, right);
        assert_ne!(left, FilterSet::new().with("x", "1").with("y", "3"));
    }

    #[test]
    fn test_serde_keeps_field_order() {
        let filters: FilterSet =
            serde_json::from_str(r#"{"status":"open","color":"red","tag":["zeta","alpha"]}"#)
                .unwrap();
        let fields: Vec<&str> = filters.iter().map(|(k, _)| k).collect();
        assert_eq!(fields, vec!["status", "color", "tag"]);
        assert_eq!(
            serde_json::to_string(&filters).unwrap(),
            r#"{"status":"open","color":"red","tag":["zeta","alpha"]}"#
        );
    }
}
