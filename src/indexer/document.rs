//! Record-to-document mapping.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// A search document: field name to value, in insertion order.
pub type Document = Map<String, Value>;

/// A persisted record that can be indexed.
pub trait Record {
    /// Record type, e.g. `article`. Distinguishes records of different kinds
    /// sharing one index.
    fn record_type(&self) -> &str;

    /// Identifier, unique within the record type.
    fn record_id(&self) -> String;

    /// Persisted scalar columns.
    fn fields(&self) -> Vec<(String, Value)>;
}

/// Index-wide document id: `<record_type>_<record_id>`.
#[must_use]
pub fn document_id(record: &dyn Record) -> String {
    format!("{}_{}", record.record_type(), record.record_id())
}

/// Adds per-type fields to a document after the columns are copied.
pub type Mapper = Box<dyn Fn(&dyn Record, &mut Document) + Send + Sync>;

/// Custom mappers keyed by record type.
#[derive(Default)]
pub struct MapperRegistry {
    mappers: HashMap<String, Mapper>,
}

impl fmt::Debug for MapperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&String> = self.mappers.keys().collect();
        types.sort();
        f.debug_struct("MapperRegistry")
            .field("types", &types)
            .finish()
    }
}

impl MapperRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the mapper for `record_type`, replacing any previous one.
    pub fn register<F>(&mut self, record_type: impl Into<String>, mapper: F)
    where
        F: Fn(&dyn Record, &mut Document) + Send + Sync + 'static,
    {
        self.mappers.insert(record_type.into(), Box::new(mapper));
    }

    /// Builder form of [`Self::register`].
    #[must_use]
    pub fn with<F>(mut self, record_type: impl Into<String>, mapper: F) -> Self
    where
        F: Fn(&dyn Record, &mut Document) + Send + Sync + 'static,
    {
        self.register(record_type, mapper);
        self
    }

    /// Returns the mapper for `record_type`.
    #[must_use]
    pub fn get(&self, record_type: &str) -> Option<&Mapper> {
        self.mappers.get(record_type)
    }
}

/// Builds the document for `record`.
///
/// Sets `id`, `record_type` and `record_id`, copies every column except
/// `id`, applies the registered mapper, then drops null, blank-string and
/// empty-array values.
#[must_use]
pub fn to_document(record: &dyn Record, registry: &MapperRegistry) -> Document {
    let mut doc = Document::new();
    doc.insert("id".to_string(), Value::String(document_id(record)));
    doc.insert(
        "record_type".to_string(),
        Value::String(record.record_type().to_string()),
    );
    doc.insert("record_id".to_string(), id_value(&record.record_id()));

    for (name, value) in record.fields() {
        if name != "id" {
            doc.insert(name, value);
        }
    }

    if let Some(mapper) = registry.get(record.record_type()) {
        mapper(record, &mut doc);
    }

    doc.retain(|_, value| !is_empty_value(value));
    doc
}

/// Numeric ids are indexed as numbers.
fn id_value(id: &str) -> Value {
    id.parse::<i64>()
        .map_or_else(|_| Value::String(id.to_string()), Value::from)
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// A record held as a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct MapRecord {
    record_type: String,
    record_id: String,
    fields: Document,
}

impl MapRecord {
    /// Creates a record from its type, id and columns.
    #[must_use]
    pub fn new(record_type: impl Into<String>, record_id: impl Into<String>, fields: Document) -> Self {
        Self {
            record_type: record_type.into(),
            record_id: record_id.into(),
            fields,
        }
    }

    /// Creates a record from a JSON object, reading the id from `id_field`.
    ///
    /// Returns `None` if `value` is not an object or has no usable id.
    #[must_use]
    pub fn from_json(record_type: &str, id_field: &str, value: Value) -> Option<Self> {
        let Value::Object(fields) = value else {
            return None;
        };
        let id = match fields.get(id_field)? {
            Value::String(s) if !s.trim().is_empty() => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        Some(Self::new(record_type, id, fields))
    }
}

impl Record for MapRecord {
    fn record_type(&self) -> &str {
        &self.record_type
    }

    fn record_id(&self) -> String {
        self.record_id.clone()
    }

    fn fields(&self) -> Vec<(String, Value)> {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
