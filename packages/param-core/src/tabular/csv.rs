//! Line-oriented CSV decoding.

use serde_json::{Map, Value as Raw};

use super::{TabularData, TabularRow};
use crate::error::{ParamError, Result};

const BOM: char = '\u{feff}';

/// Decodes CSV text.
///
/// The first non-blank line holds the headers. Each later non-blank line
/// becomes a row only when its field count equals the header count; other
/// lines are skipped.
///
/// # Errors
/// `ParseFailure` when the text has no non-blank line or a line ends inside
/// a quoted field.
pub fn parse_csv(text: &str) -> Result<TabularData> {
    let mut lines = text
        .split('\n')
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let (header_line_no, first) = lines
        .next()
        .ok_or_else(|| ParamError::ParseFailure("CSV file is empty".to_string()))?;
    let first = first.strip_prefix(BOM).unwrap_or(first);
    let headers = parse_csv_line(first).map_err(|e| at_line(header_line_no, e))?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for (line_no, line) in lines {
        let values = parse_csv_line(line).map_err(|e| at_line(line_no, e))?;
        if values.len() != headers.len() {
            skipped += 1;
            continue;
        }
        let cells: Map<String, Raw> = headers
            .iter()
            .cloned()
            .zip(values.into_iter().map(Raw::String))
            .collect();
        rows.push(TabularRow { id: None, cells });
    }

    if skipped > 0 {
        tracing::warn!(
            skipped,
            expected_fields = headers.len(),
            "Skipped CSV rows with mismatched field count"
        );
    }

    Ok(TabularData { headers, rows })
}

fn at_line(line_index: usize, err: ParamError) -> ParamError {
    match err {
        ParamError::ParseFailure(msg) => {
            ParamError::ParseFailure(format!("line {}: {}", line_index + 1, msg))
        }
        other => other,
    }
}

/// Splits one CSV line into trimmed fields.
///
/// Commas inside double quotes do not separate fields, and `""` inside a
/// quoted section is a literal quote.
///
/// # Errors
/// `ParseFailure` when a quoted section is not closed.
pub fn parse_csv_line(line: &str) -> Result<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if in_quotes {
        return Err(ParamError::ParseFailure(
            "unterminated quoted field".to_string(),
        ));
    }
    fields.push(current.trim().to_string());
    Ok(fields)
}

/// Quotes a field for output when it contains a comma, doubling inner quotes.
pub fn escape_csv_field(value: &str) -> String {
    if value.contains(',') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
