//! JSON array-of-objects decoding.

use serde_json::Value as Raw;

use super::{TabularData, TabularRow};
use crate::error::{ParamError, Result};
use crate::ids::row_id;

/// Decodes a JSON array of objects.
///
/// Headers are the union of every element's keys except `id`, in first-seen
/// order. Each row keeps its own truthy `id`, or receives `<seed>_<index>`.
///
/// # Errors
/// `ParseFailure` on invalid JSON, a non-array top level, or a non-object
/// element.
pub fn parse_json(text: &str, seed: i64) -> Result<TabularData> {
    let parsed: Raw = serde_json::from_str(text)
        .map_err(|e| ParamError::ParseFailure(format!("invalid JSON: {}", e)))?;

    let elements = match parsed {
        Raw::Array(elements) => elements,
        other => {
            return Err(ParamError::ParseFailure(format!(
                "JSON import must be an array of objects, got {}",
                kind_name(&other)
            )))
        }
    };

    let mut headers: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(elements.len());

    for (index, element) in elements.into_iter().enumerate() {
        let mut cells = match element {
            Raw::Object(map) => map,
            other => {
                return Err(ParamError::ParseFailure(format!(
                    "element {} must be an object, got {}",
                    index,
                    kind_name(&other)
                )))
            }
        };

        for key in cells.keys() {
            if key != "id" && !headers.iter().any(|h| h == key) {
                headers.push(key.clone());
            }
        }

        let id = match cells.remove("id") {
            Some(Raw::String(s)) if !s.is_empty() => s,
            Some(Raw::Number(n)) if n.as_f64() != Some(0.0) => n.to_string(),
            _ => row_id(seed, index),
        };
        rows.push(TabularRow {
            id: Some(id),
            cells,
        });
    }

    Ok(TabularData { headers, rows })
}

fn kind_name(value: &Raw) -> &'static str {
    match value {
        Raw::Null => "null",
        Raw::Bool(_) => "a boolean",
        Raw::Number(_) => "a number",
        Raw::String(_) => "a string",
        Raw::Array(_) => "an array",
        Raw::Object(_) => "an object",
    }
}
