//! Column definition within a page.

use serde::{Deserialize, Serialize};

use crate::record::Value;

/// Declared type of a column. Decides value coercion and presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Number,
    Textarea,
    Select,
    Image,
}

impl ColumnType {
    /// All column types in declaration order.
    pub const ALL: [ColumnType; 5] = [
        ColumnType::Text,
        ColumnType::Number,
        ColumnType::Textarea,
        ColumnType::Select,
        ColumnType::Image,
    ];

    /// Value assigned when a record has nothing for a column of this type.
    pub fn default_value(self) -> Value {
        match self {
            ColumnType::Number => Value::Null,
            _ => Value::Text(String::new()),
        }
    }

    /// Lowercase name as stored in page configs.
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Number => "number",
            ColumnType::Textarea => "textarea",
            ColumnType::Select => "select",
            ColumnType::Image => "image",
        }
    }

    /// Parses a lowercase type name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

/// Column definition within a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Storage and matching key, unique within a page
    pub key: String,
    /// Display name
    #[serde(default)]
    pub label: String,
    /// Declared type
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Comma-separated allowed values, used by select columns
    #[serde(default)]
    pub options: String,
    /// Help text
    #[serde(default)]
    pub description: String,
}

impl Column {
    /// Creates a column with empty options and description.
    pub fn new(key: impl Into<String>, label: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            column_type,
            options: String::new(),
            description: String::new(),
        }
    }

    /// Template used when a column is added in the editor.
    ///
    /// # Arguments
    /// * `millis` - Timestamp used to derive a fresh key
    pub fn new_default(millis: i64) -> Self {
        Self::new(format!("column_{}", millis), "新列", ColumnType::Text)
    }

    /// Sets the select options.
    pub fn with_options(mut self, options: impl Into<String>) -> Self {
        self.options = options.into();
        self
    }

    /// Returns the select option tokens, trimmed, blanks dropped.
    pub fn option_list(&self) -> Vec<&str> {
        self.options
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Label used for headers, falling back to the key when blank.
    pub fn header(&self) -> &str {
        if self.label.is_empty() {
            &self.key
        } else {
            &self.label
        }
    }

    /// Default value for this column's type.
    pub fn default_value(&self) -> Value {
        self.column_type.default_value()
    }
}

/// Direction for [`move_column`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Swaps the column at `index` with its neighbour. No-op at the ends.
pub fn move_column(columns: &mut [Column], index: usize, direction: Direction) {
    if index >= columns.len() {
        return;
    }
    match direction {
        Direction::Up if index > 0 => columns.swap(index, index - 1),
        Direction::Down if index + 1 < columns.len() => columns.swap(index, index + 1),
        _ => {}
    }
}

/// Removes the column at `index`, returning it if present.
pub fn remove_column(columns: &mut Vec<Column>, index: usize) -> Option<Column> {
    if index < columns.len() {
        Some(columns.remove(index))
    } else {
        None
    }
}
