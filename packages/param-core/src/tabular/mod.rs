//! Tabular decoders: raw file text to headers plus rows.

mod csv;
mod json;

use std::io::Read;
use std::path::Path;

use serde_json::{Map, Value as Raw};

use crate::error::{ParamError, Result};

pub use self::csv::{escape_csv_field, parse_csv, parse_csv_line};
pub use self::json::parse_json;

/// Decoded tabular source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabularData {
    /// Column headers in source order
    pub headers: Vec<String>,
    /// Data rows in source order
    pub rows: Vec<TabularRow>,
}

/// One decoded row.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularRow {
    /// Row id carried by (or assigned to) JSON rows; CSV rows have none
    pub id: Option<String>,
    /// Header to raw cell
    pub cells: Map<String, Raw>,
}

impl TabularRow {
    /// Raw cell for `header`, if the row has one.
    pub fn get(&self, header: &str) -> Option<&Raw> {
        self.cells.get(header)
    }
}

/// Supported import/export file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Json,
}

impl FileFormat {
    /// Picks the format from the file name suffix.
    ///
    /// # Errors
    /// `UnsupportedFormat` for anything other than `.csv` or `.json`.
    pub fn from_filename(file_name: &str) -> Result<Self> {
        if file_name.ends_with(".csv") {
            Ok(FileFormat::Csv)
        } else if file_name.ends_with(".json") {
            Ok(FileFormat::Json)
        } else {
            Err(ParamError::UnsupportedFormat {
                file_name: file_name.to_string(),
            })
        }
    }

    /// Same as [`FileFormat::from_filename`] for a path's final component.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_filename(&name)
    }

    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Json => "json",
        }
    }
}

/// Reads an entire source into text.
///
/// # Errors
/// `ReadFailure` when the reader fails or the bytes are not UTF-8.
pub fn read_source<R: Read>(mut reader: R) -> Result<String> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| ParamError::ReadFailure(format!("failed to read file: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| ParamError::ReadFailure(format!("file is not valid UTF-8: {}", e)))
}

/// Decodes `text` in the given format.
///
/// # Arguments
/// * `format` - Source format
/// * `text` - Whole file content
/// * `seed` - Seed for ids of JSON rows that carry none
pub fn decode(format: FileFormat, text: &str, seed: i64) -> Result<TabularData> {
    match format {
        FileFormat::Csv => parse_csv(text),
        FileFormat::Json => parse_json(text, seed),
    }
}
