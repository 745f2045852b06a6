//! CSV and JSON export of page records.

use crate::error::Result;
use crate::record::{Record, Value};
use crate::schema::{Column, ColumnType};
use crate::tabular::{escape_csv_field, FileFormat};

/// Placeholder written instead of embedded image payloads in CSV output.
pub const IMAGE_PLACEHOLDER: &str = "[图片]";

const BOM: &str = "\u{feff}";

/// Renders records as CSV text for `columns`.
///
/// The header row uses each column's label (or key when blank). Non-empty
/// image cells become [`IMAGE_PLACEHOLDER`]. Output starts with a byte-order
/// mark and rows are joined with `\n`.
pub fn export_csv<'a, I>(records: I, columns: &[Column]) -> String
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut lines = Vec::new();
    lines.push(
        columns
            .iter()
            .map(|c| c.header())
            .collect::<Vec<_>>()
            .join(","),
    );

    for record in records {
        let cells: Vec<String> = columns
            .iter()
            .map(|column| render_cell(record.get(&column.key), column.column_type))
            .collect();
        lines.push(cells.join(","));
    }

    format!("{}{}", BOM, lines.join("\n"))
}

fn render_cell(value: Option<&Value>, column_type: ColumnType) -> String {
    let value = match value {
        Some(v) if !v.is_empty() => v,
        _ => return String::new(),
    };
    if column_type == ColumnType::Image {
        return IMAGE_PLACEHOLDER.to_string();
    }
    escape_csv_field(&value.to_string())
}

/// Renders records as a pretty-printed JSON array, values verbatim.
pub fn export_json<'a, I>(records: I) -> Result<String>
where
    I: IntoIterator<Item = &'a Record>,
{
    let records: Vec<&Record> = records.into_iter().collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

/// Renders records in `format`.
pub fn export<'a, I>(format: FileFormat, records: I, columns: &[Column]) -> Result<String>
where
    I: IntoIterator<Item = &'a Record>,
{
    match format {
        FileFormat::Csv => Ok(export_csv(records, columns)),
        FileFormat::Json => export_json(records),
    }
}

/// Builds the download file name for an export.
///
/// `<page>_<millis>.<ext>`, or `<page>_selected_<millis>.<ext>` for a
/// selection.
pub fn export_file_name(page_name: &str, format: FileFormat, selected: bool, millis: i64) -> String {
    if selected {
        format!("{}_selected_{}.{}", page_name, millis, format.extension())
    } else {
        format!("{}_{}.{}", page_name, millis, format.extension())
    }
}
