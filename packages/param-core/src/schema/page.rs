//! Page: a named dataset and its ordered columns.

use serde::{Deserialize, Serialize};

use super::column::Column;
use super::validation::validate_columns;
use crate::error::{ParamError, Result};

/// Named dataset with its own schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Stable identity
    pub id: String,
    /// Display name, non-empty once saved
    pub name: String,
    /// Ordered column list
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl Page {
    /// Creates a page with no columns. The name is trimmed and must not be blank.
    pub fn new(id: impl Into<String>, name: &str) -> Result<Self> {
        Ok(Self {
            id: id.into(),
            name: normalize_name(name)?,
            columns: Vec::new(),
        })
    }

    /// Renames the page under the same rule as [`Page::new`].
    pub fn rename(&mut self, name: &str) -> Result<()> {
        self.name = normalize_name(name)?;
        Ok(())
    }

    /// Replaces the whole column list after validating it.
    ///
    /// Nothing changes when validation fails.
    pub fn replace_columns(&mut self, columns: Vec<Column>) -> Result<()> {
        validate_columns(&columns)?;
        self.columns = columns;
        Ok(())
    }

    /// Looks up a column by key.
    pub fn column(&self, key: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.key == key)
    }
}

fn normalize_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ParamError::EmptyPageName);
    }
    Ok(trimmed.to_string())
}
