//! Validation of column lists and stored page configs.

use std::collections::HashSet;

use super::column::Column;
use super::page::Page;
use crate::error::{ParamError, Result};

/// Key under which every record stores its id; no column may use it.
pub const RESERVED_KEY: &str = "id";

/// Validates that every column key is non-empty, unique and not
/// [`RESERVED_KEY`].
///
/// # Arguments
/// * `columns` - Column list about to be saved
///
/// # Returns
/// `Result<()>` indicating success or the first violation found.
pub fn validate_columns(columns: &[Column]) -> Result<()> {
    let mut seen = HashSet::with_capacity(columns.len());
    for (index, column) in columns.iter().enumerate() {
        if column.key.trim().is_empty() {
            return Err(ParamError::InvalidSchema(format!(
                "Column at position {} has an empty key",
                index
            )));
        }
        if column.key == RESERVED_KEY {
            return Err(ParamError::InvalidSchema(format!(
                "Column key '{}' is reserved for the record id",
                RESERVED_KEY
            )));
        }
        if !seen.insert(column.key.as_str()) {
            return Err(ParamError::InvalidSchema(format!(
                "Duplicate column key '{}'",
                column.key
            )));
        }
    }
    Ok(())
}

/// Validates a full page config list loaded from storage.
///
/// Page ids must be unique and every page must satisfy [`validate_columns`].
pub fn validate_pages(pages: &[Page]) -> Result<()> {
    let mut ids = HashSet::with_capacity(pages.len());
    for page in pages {
        if !ids.insert(page.id.as_str()) {
            return Err(ParamError::DataCorruption(format!(
                "Duplicate page id '{}'",
                page.id
            )));
        }
        validate_columns(&page.columns).map_err(|e| {
            ParamError::DataCorruption(format!("Page '{}' has an invalid schema: {}", page.id, e))
        })?;
    }
    Ok(())
}
