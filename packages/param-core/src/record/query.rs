//! Record filtering and selection.

use std::collections::{HashMap, HashSet};

use super::Record;

/// Per-column substring filter with optional paging.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    /// Column key to filter text; blank entries are ignored
    pub contains: HashMap<String, String>,
    /// Maximum number of records to return
    pub limit: Option<usize>,
    /// Number of matching records to skip
    pub offset: Option<usize>,
}

impl RecordFilter {
    /// Adds a substring condition on `key`.
    pub fn contains(mut self, key: impl Into<String>, needle: impl Into<String>) -> Self {
        self.contains.insert(key.into(), needle.into());
        self
    }

    /// Sets the page size.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the number of matches to skip.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Returns records whose rendered value contains every filter text,
/// compared case-insensitively.
///
/// # Arguments
/// * `records` - Records in stored order
/// * `filter` - Conditions and paging
///
/// # Returns
/// Matching records in stored order, after `offset` and `limit`.
pub fn filter_records<'a>(records: &'a [Record], filter: &RecordFilter) -> Vec<&'a Record> {
    let conditions: Vec<(&str, String)> = filter
        .contains
        .iter()
        .filter(|(_, needle)| !needle.trim().is_empty())
        .map(|(key, needle)| (key.as_str(), needle.to_lowercase()))
        .collect();

    let skip_count = filter.offset.unwrap_or(0);
    let take_count = filter.limit.unwrap_or(usize::MAX);

    records
        .iter()
        .filter(|record| {
            conditions.iter().all(|(key, needle)| {
                let rendered = record
                    .get(key)
                    .map(|v| v.to_string())
                    .unwrap_or_default()
                    .to_lowercase();
                rendered.contains(needle.as_str())
            })
        })
        .skip(skip_count)
        .take(take_count)
        .collect()
}

/// Returns the records whose id is in `ids`, in stored order.
pub fn select_records<'a>(records: &'a [Record], ids: &[String]) -> Vec<&'a Record> {
    let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
    records
        .iter()
        .filter(|r| wanted.contains(r.id.as_str()))
        .collect()
}
