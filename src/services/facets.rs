//! Facet result processing.
//!
//! The engine reports list facets flattened as `[value, count, value, count, ...]`.
//! These are paired up in order; non-list facets pass through unchanged.

use crate::models::{FacetField, FacetMap};
use crate::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Converts raw `facet_fields` into a [`FacetMap`].
///
/// # Errors
///
/// Returns [`Error::MalformedResponse`] if `raw` is not an object, a list
/// facet has odd length, or a count is not a non-negative integer.
pub fn process_facets(raw: &Value) -> Result<FacetMap> {
    let Value::Object(fields) = raw else {
        return Err(Error::MalformedResponse {
            reason: format!("facet_fields must be an object, got {raw}"),
        });
    };

    let mut facets = FacetMap::new();
    for (field, value) in fields {
        let facet = match value {
            Value::Array(flat) => FacetField::Counts(pair_counts(field, flat)?),
            other => FacetField::Structured(other.clone()),
        };
        facets.insert(field.clone(), facet);
    }
    Ok(facets)
}

/// Reads `facet_counts.facet_fields` from a full response.
///
/// Responses without facet counts yield an empty map.
///
/// # Errors
///
/// Propagates errors from [`process_facets`].
pub fn facets_from_response(response: &Value) -> Result<FacetMap> {
    match response.pointer("/facet_counts/facet_fields") {
        Some(raw) => process_facets(raw),
        None => Ok(FacetMap::new()),
    }
}

fn pair_counts(field: &str, flat: &[Value]) -> Result<Vec<(String, u64)>> {
    if flat.len() % 2 != 0 {
        return Err(Error::MalformedResponse {
            reason: format!(
                "facet field '{field}' has odd length {} (expected value/count pairs)",
                flat.len()
            ),
        });
    }

    let mut pairs: Vec<(String, u64)> = Vec::with_capacity(flat.len() / 2);
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(flat.len() / 2);
    for chunk in flat.chunks_exact(2) {
        let value = facet_value(&chunk[0]);
        let count = chunk[1].as_u64().ok_or_else(|| Error::MalformedResponse {
            reason: format!("facet field '{field}' has non-integer count {}", chunk[1]),
        })?;
        // a repeated value keeps its first position, last count wins
        match positions.entry(value) {
            Entry::Occupied(slot) => pairs[*slot.get()].1 = count,
            Entry::Vacant(slot) => {
                pairs.push((slot.key().clone(), count));
                slot.insert(pairs.len() - 1);
            },
        }
    }
    Ok(pairs)
}

fn facet_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pairs_in_order() {
        let facets = process_facets(&json!({"color": ["red", 5, "blue", 3]})).unwrap();
        let color = facets.get("color").unwrap();
        assert_eq!(
            color.counts().unwrap(),
            &[("red".to_string(), 5), ("blue".to_string(), 3)]
        );
    }

    #[test]
    fn test_field_order_preserved() {
        let facets =
            process_facets(&json!({"size": ["xl", 1], "color": [], "brand": ["acme", 2]}))
                .unwrap();
        let names: Vec<&str> = facets.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["size", "color", "brand"]);
        assert!(facets.get("color").unwrap().is_empty());
    }

    #[test]
    fn test_odd_length_is_malformed() {
        let err = process_facets(&json!({"color": ["red", 5, "blue"]})).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }));
        assert!(err.to_string().contains("color"));
    }

    #[test]
    fn test_bad_count_is_malformed() {
        let err = process_facets(&json!({"color": ["red", "five"]})).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }));
    }

    #[test]
    fn test_structured_passthrough() {
        let raw = json!({"created": {"counts": ["2020", 4], "gap": "+1YEAR"}});
        let facets = process_facets(&raw).unwrap();
        assert_eq!(
            facets.get("created"),
            Some(&FacetField::Structured(
                json!({"counts": ["2020", 4], "gap": "+1YEAR"})
            ))
        );
    }

    #[test]
    fn test_numeric_values_stringified() {
        let facets = process_facets(&json!({"year": [2020, 7]})).unwrap();
        assert_eq!(facets.get("year").unwrap().count("2020"), Some(7));
    }

    #[test]
    fn test_missing_facet_counts() {
        let facets = facets_from_response(&json!({"response": {"numFound": 0}})).unwrap();
        assert!(facets.is_empty());
    }

    #[test]
    fn test_repeated_value_keeps_first_position() {
        let facets = process_facets(&json!({"color": ["red", 5, "blue", 3, "red", 9]})).unwrap();
        assert_eq!(
            facets.get("color").unwrap().counts().unwrap(),
            &[("red".to_string(), 9), ("blue".to_string(), 3)]
        );
    }

    #[test]
    fn test_high_cardinality_facet() {
        let flat: Vec<Value> = (0..100_000u64)
            .flat_map(|n| [json!(format!("v{n}")), json!(n)])
            .collect();
        let facets = process_facets(&json!({ "sku": flat })).unwrap();
        let sku = facets.get("sku").unwrap();
        assert_eq!(sku.counts().unwrap().len(), 100_000);
        assert_eq!(sku.counts().unwrap()[99_999], ("v99999".to_string(), 99_999));
    }

    #[test]
    fn test_non_object_is_malformed() {
        assert!(process_facets(&json!(["color", 1])).is_err());
    }
}
