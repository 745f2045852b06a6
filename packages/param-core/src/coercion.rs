//! Conversion of raw external cell values to a column's declared type.
//!
//! Coercion is total: every input yields a value, never an error. Bad
//! numbers degrade to `Null`, missing text degrades to the empty string.

use serde_json::Value as Raw;

use crate::record::{format_number, Value};
use crate::schema::ColumnType;

/// Coerces a raw cell to the semantic type of `column_type`.
///
/// # Arguments
/// * `raw` - Cell as decoded from CSV (always a string) or JSON, `None` when absent
/// * `column_type` - Declared type of the target column
///
/// # Returns
/// The typed value. Number columns yield `Number` or `Null`; every other
/// type yields `Text`.
pub fn coerce(raw: Option<&Raw>, column_type: ColumnType) -> Value {
    match column_type {
        ColumnType::Number => coerce_number(raw),
        ColumnType::Text | ColumnType::Textarea | ColumnType::Select => {
            Value::Text(truthy_text(raw).unwrap_or_default())
        }
        ColumnType::Image => match raw {
            Some(Raw::String(payload)) => Value::Text(payload.clone()),
            None | Some(Raw::Null) => Value::Text(String::new()),
            Some(other) => Value::Text(render_raw(other)),
        },
    }
}

fn coerce_number(raw: Option<&Raw>) -> Value {
    match raw {
        None | Some(Raw::Null) => Value::Null,
        Some(Raw::Number(n)) => n.as_f64().map(Value::from).unwrap_or(Value::Null),
        Some(Raw::String(s)) if s.is_empty() => Value::Null,
        Some(Raw::String(s)) => parse_float(s).map(Value::Number).unwrap_or(Value::Null),
        Some(_) => Value::Null,
    }
}

/// Returns the text of a truthy raw value, `None` for falsy ones
/// (`null`, `false`, `0`, `""`).
fn truthy_text(raw: Option<&Raw>) -> Option<String> {
    match raw? {
        Raw::Null | Raw::Bool(false) => None,
        Raw::String(s) if s.is_empty() => None,
        Raw::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(render_raw(other)),
    }
}

fn render_raw(raw: &Raw) -> String {
    match raw {
        Raw::String(s) => s.clone(),
        Raw::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format_number(f),
            _ => n.to_string(),
        },
        Raw::Null => String::new(),
        other => other.to_string(),
    }
}

/// Parses the longest leading decimal literal of `s`, after leading
/// whitespace. Trailing garbage is ignored (`"12kg"` is 12).
///
/// Returns `None` when no digits are found or the result is not finite.
pub fn parse_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}
