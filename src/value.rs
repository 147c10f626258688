//! Tagged values for form data and structured responses.
//!
//! Structured responses and serialized forms share one representation: a
//! [`Record`] of field names to [`FormValue`]s. Field handlers pattern-match
//! over the tag set instead of probing runtime types.
//!
//! # Example
//!
//! ```ignore
//! use sxkit::{FormValue, Record};
//!
//! let record = Record::parse(r#"{"name":"a","tags":["x","y"]}"#).unwrap();
//! assert_eq!(record.get("name"), Some(&FormValue::from("a")));
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Number, Value};

// ============================================================================
// FormValue
// ============================================================================

/// A single field value.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum FormValue {
    /// Missing or `null`.
    Absent,

    /// Boolean flag.
    Bool(bool),

    /// Numeric value.
    Number(Number),

    /// Free text.
    Text(String),

    /// Ordered sequence of values.
    List(Vec<FormValue>),
}

impl FormValue {
    /// Converts a JSON value into its tagged form.
    ///
    /// Nested objects have no field-level meaning and are kept as their
    /// JSON text.
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Absent,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::Text(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from_json).collect()),
            Value::Object(map) => Self::Text(Value::Object(map).to_string()),
        }
    }

    /// Returns the text a document field would hold for this value.
    ///
    /// Lists join their items with `,`.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Absent => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
            Self::List(items) => items
                .iter()
                .map(Self::to_text)
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// Returns `false` for absent, `false`, zero and empty text.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Absent => false,
            Self::Bool(b) => *b,
            Self::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Self::Text(s) => !s.is_empty(),
            Self::List(_) => true,
        }
    }

    /// Returns the value as a list of texts: list items, or a singleton.
    #[must_use]
    pub fn text_set(&self) -> Vec<String> {
        match self {
            Self::List(items) => items.iter().map(Self::to_text).collect(),
            other => vec![other.to_text()],
        }
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FormValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FormValue {
    fn from(value: i64) -> Self {
        Self::Number(Number::from(value))
    }
}

impl<T: Into<FormValue>> From<Vec<T>> for FormValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

// ============================================================================
// Record
// ============================================================================

/// An insertion-ordered keyed map of [`FormValue`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: Vec<(String, FormValue)>,
}

impl Record {
    /// Creates an empty record.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses response text as a keyed value.
    ///
    /// Anything other than a JSON object is rejected.
    pub fn parse(text: &str) -> crate::Result<Self> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(map) => Ok(Self::from_json_object(map)),
            other => Err(crate::Error::parse(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Builds a record from a JSON object.
    #[must_use]
    pub fn from_json_object(map: Map<String, Value>) -> Self {
        map.into_iter()
            .map(|(key, value)| (key, FormValue::from_json(value)))
            .collect()
    }

    /// Returns the value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FormValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    /// Inserts or replaces the value for `key`, keeping first-insert order.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FormValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormValue)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Returns the number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the record has no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serializes the record as a JSON object string.
    pub fn to_json_string(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl<K: Into<String>, V: Into<FormValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Names a JSON value kind for error messages.
fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object() {
        let record = Record::parse(r#"{"name":"a","n":5,"ok":true,"tags":["x",1],"gone":null}"#)
            .unwrap();
        assert_eq!(record.get("name"), Some(&FormValue::from("a")));
        assert_eq!(record.get("n"), Some(&FormValue::from(5_i64)));
        assert_eq!(record.get("ok"), Some(&FormValue::Bool(true)));
        assert_eq!(
            record.get("tags"),
            Some(&FormValue::List(vec![FormValue::from("x"), FormValue::from(1_i64)]))
        );
        assert_eq!(record.get("gone"), Some(&FormValue::Absent));
    }

    #[test]
    fn test_parse_keeps_response_key_order() {
        let record = Record::parse(r#"{"zeta":1,"alpha":2,"mid":{"z":0,"a":1}}"#).unwrap();
        let keys: Vec<_> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
        assert_eq!(record.get("mid"), Some(&FormValue::from(r#"{"z":0,"a":1}"#)));
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(Record::parse("[1,2]").unwrap_err().is_parse_error());
        assert!(Record::parse("<li>x</li>").unwrap_err().is_parse_error());
    }

    #[test]
    fn test_nested_object_kept_as_text() {
        let record = Record::parse(r#"{"meta":{"a":1}}"#).unwrap();
        assert_eq!(record.get("meta"), Some(&FormValue::from(r#"{"a":1}"#)));
    }

    #[test]
    fn test_to_text() {
        assert_eq!(FormValue::Absent.to_text(), "");
        assert_eq!(FormValue::from(42_i64).to_text(), "42");
        assert_eq!(FormValue::from(false).to_text(), "false");
        assert_eq!(FormValue::from(vec!["a", "b"]).to_text(), "a,b");
    }

    #[test]
    fn test_is_truthy() {
        assert!(!FormValue::Absent.is_truthy());
        assert!(!FormValue::from("").is_truthy());
        assert!(!FormValue::from(0_i64).is_truthy());
        assert!(FormValue::from("2024-01-01").is_truthy());
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut record = Record::new();
        record.insert("b", 1_i64);
        record.insert("a", 2_i64);
        record.insert("b", 3_i64);
        let keys: Vec<_> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["b", "a"]);
        assert_eq!(record.get("b"), Some(&FormValue::from(3_i64)));
    }

    #[test]
    fn test_serialize() {
        let record: Record = [("tag", FormValue::from(vec!["x", "y"])), ("n", FormValue::from(7_i64))]
            .into_iter()
            .collect();
        assert_eq!(record.to_json_string().unwrap(), r#"{"tag":["x","y"],"n":7}"#);
    }
}
