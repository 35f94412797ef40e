use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::fmt;

static ABSENT: FieldValue = FieldValue::Null;

/// A single display-primitive value carried by a record field.
///
/// Anything richer than these five shapes (nested arrays/objects in the
/// backend payload) is coerced to its JSON string form on ingest.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl FieldValue {
    pub fn from_json(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => FieldValue::Null,
            JsonValue::Bool(b) => FieldValue::Bool(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Int(i)
                } else if let Some(f) = n.as_f64() {
                    FieldValue::Float(f)
                } else {
                    FieldValue::Str(n.to_string())
                }
            }
            JsonValue::String(s) => FieldValue::Str(s.clone()),
            // Complex shapes are stored as their JSON text
            other => FieldValue::Str(other.to_string()),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            FieldValue::Str(s) => JsonValue::String(s.clone()),
            FieldValue::Int(i) => JsonValue::from(*i),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            FieldValue::Bool(b) => JsonValue::Bool(*b),
            FieldValue::Null => JsonValue::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Numeric reading used by badge renderers; None for non-numeric values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            FieldValue::Str(s) => s.parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Str(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Null => write!(f, ""),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Str(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Str(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

/// One row's worth of field data, an immutable snapshot handed to the
/// browser by whoever fetched it. Missing fields behave as `Null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: HashMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used by fixtures and the snapshot backend.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Build a record from a JSON object; non-objects yield None.
    pub fn from_json(json: &JsonValue) -> Option<Self> {
        let obj = json.as_object()?;
        let mut fields = HashMap::with_capacity(obj.len());
        for (key, value) in obj {
            fields.insert(key.clone(), FieldValue::from_json(value));
        }
        Some(Self { fields })
    }

    /// Convert a JSON array of objects into records, skipping non-objects.
    pub fn from_rows(rows: &[JsonValue]) -> Vec<Record> {
        rows.iter().filter_map(Record::from_json).collect()
    }

    pub fn to_json(&self) -> JsonValue {
        let mut obj = Map::new();
        for (key, value) in &self.fields {
            obj.insert(key.clone(), value.to_json());
        }
        JsonValue::Object(obj)
    }

    /// Field lookup; absent keys read as `Null` rather than erroring.
    pub fn get(&self, key: &str) -> &FieldValue {
        self.fields.get(key).unwrap_or(&ABSENT)
    }

    /// The raw string coercion of a field, as used for search matching.
    /// `Null`/absent coerce to the empty string.
    pub fn coerce(&self, key: &str) -> String {
        self.get(key).to_string()
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_primitives() {
        let record = Record::from_json(&json!({
            "u_id": "S_001",
            "name": "Asha",
            "percentage": 82.5,
            "present": 33,
            "active": true,
            "phone": null
        }))
        .unwrap();

        assert_eq!(record.get("u_id"), &FieldValue::Str("S_001".into()));
        assert_eq!(record.get("present"), &FieldValue::Int(33));
        assert_eq!(record.get("percentage"), &FieldValue::Float(82.5));
        assert_eq!(record.get("active"), &FieldValue::Bool(true));
        assert!(record.get("phone").is_null());
    }

    #[test]
    fn test_absent_field_reads_as_null() {
        let record = Record::new().with_field("name", "Ravi");
        assert!(record.get("email").is_null());
        assert_eq!(record.coerce("email"), "");
    }

    #[test]
    fn test_complex_values_coerce_to_json_text() {
        let record = Record::from_json(&json!({"tags": ["a", "b"]})).unwrap();
        assert_eq!(record.coerce("tags"), r#"["a","b"]"#);
    }

    #[test]
    fn test_non_object_rows_are_skipped() {
        let rows = vec![json!({"u_id": "S_001"}), json!(42), json!({"u_id": "S_002"})];
        let records = Record::from_rows(&rows);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_json_round_trip() {
        let record = Record::new()
            .with_field("u_id", "F_001")
            .with_field("classes", 12i64);
        let back = Record::from_json(&record.to_json()).unwrap();
        assert_eq!(back, record);
    }
}
