//! Records: one row of a page, keyed by column key plus a stable id.

mod query;

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::schema::{Column, ColumnType};

pub use query::{filter_records, select_records, RecordFilter};

/// A single cell value.
///
/// Stored as plain JSON: `null`, a number, or a string. Numbers are always
/// finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum Value {
    Null,
    Number(f64),
    Text(String),
}

impl Value {
    /// Returns true for `Null` and the empty string.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Number(_) => false,
            Value::Text(s) => s.is_empty(),
        }
    }

    /// Returns the number, if this is one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the text, if this is a string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Renders the value for a table cell.
    ///
    /// Empty numbers show `NONE`, other empty cells show `-`.
    pub fn display(&self, column_type: ColumnType) -> String {
        match (column_type, self) {
            (ColumnType::Number, Value::Null) => "NONE".to_string(),
            (ColumnType::Number, Value::Text(s)) if s.is_empty() => "NONE".to_string(),
            (_, v) if v.is_empty() => "-".to_string(),
            (_, v) => v.to_string(),
        }
    }
}

/// Formats a number the way it is shown and exported: integers without a
/// fractional part, other values in shortest round-trip form.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Bool(b) => Value::Text(b.to_string()),
            other => Value::Text(other.to_string()),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 => {
                serde_json::Value::from(n as i64)
            }
            Value::Number(n) => serde_json::Value::from(n),
            Value::Text(s) => serde_json::Value::String(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        if n.is_finite() {
            Value::Number(n)
        } else {
            Value::Null
        }
    }
}

/// One row of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique within the page, never reused
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Cell values keyed by column key, in insertion order
    #[serde(flatten)]
    pub fields: IndexMap<String, Value>,
}

impl Record {
    /// Creates a record with no fields.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: IndexMap::new(),
        }
    }

    /// Creates a record with every column set to its type default.
    pub fn with_defaults(id: impl Into<String>, columns: &[Column]) -> Self {
        let mut record = Self::new(id);
        record.backfill(columns);
        record
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Sets the value stored under `key`.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    /// Builder form of [`Record::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value.into());
        self
    }

    /// Inserts the type default for every column the record lacks.
    ///
    /// Keys left over from earlier schemas are kept.
    pub fn backfill(&mut self, columns: &[Column]) {
        for column in columns {
            self.fields
                .entry(column.key.clone())
                .or_insert_with(|| column.default_value());
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "record id must be a string or number, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ntest::timeout;

    #[timeout(1000)]
    #[test]
    fn test_record_serializes_flat() {
        let record = Record::new("r1").with("name", "Widget").with("qty", 5.0);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, serde_json::json!({"id": "r1", "name": "Widget", "qty": 5}));

        let back: Record = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[timeout(1000)]
    #[test]
    fn test_field_order_kept() {
        let record = Record::new("r1").with("zeta", "a").with("alpha", "b");
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"id":"r1","zeta":"a","alpha":"b"}"#
        );

        let parsed: Record = serde_json::from_str(r#"{"width":1,"id":"r2","depth":2,"area":3}"#).unwrap();
        let keys: Vec<&str> = parsed.fields.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["width", "depth", "area"]);
    }

    #[timeout(1000)]
    #[test]
    fn test_numeric_id_accepted() {
        let record: Record = serde_json::from_str(r#"{"id": 42, "qty": null}"#).unwrap();
        assert_eq!(record.id, "42");
        assert_eq!(record.get("qty"), Some(&Value::Null));
    }

    #[timeout(1000)]
    #[test]
    fn test_backfill_keeps_existing_and_stale_keys() {
        let columns = vec![
            Column::new("name", "Name", ColumnType::Text),
            Column::new("qty", "Qty", ColumnType::Number),
        ];
        let mut record = Record::new("r1").with("name", "Bolt").with("old", "x");
        record.backfill(&columns);
        assert_eq!(record.get("name"), Some(&Value::from("Bolt")));
        assert_eq!(record.get("qty"), Some(&Value::Null));
        assert_eq!(record.get("old"), Some(&Value::from("x")));
    }

    #[timeout(1000)]
    #[test]
    fn test_display_placeholders() {
        assert_eq!(Value::Null.display(ColumnType::Number), "NONE");
        assert_eq!(Value::Number(3.5).display(ColumnType::Number), "3.5");
        assert_eq!(Value::from("").display(ColumnType::Text), "-");
        assert_eq!(Value::from("ok").display(ColumnType::Select), "ok");
    }

    #[timeout(1000)]
    #[test]
    fn test_format_number() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(-2.0), "-2");
        assert_eq!(format_number(3.25), "3.25");
    }

    #[timeout(1000)]
    #[test]
    fn test_non_finite_becomes_null() {
        assert_eq!(Value::from(f64::NAN), Value::Null);
        assert_eq!(Value::from(f64::INFINITY), Value::Null);
    }
}
