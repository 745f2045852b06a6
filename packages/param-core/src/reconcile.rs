//! Header reconciliation: matching external headers to page columns.
//!
//! Each header is tried in order. An exact key/label match wins over a
//! case-insensitive substring match, and a column claimed by one header is
//! never offered to a later one. Ties go to the first column in schema order.

use crate::schema::Column;

/// How a header was matched to its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Fuzzy,
}

/// One header-to-column assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMatch {
    /// External header text
    pub header: String,
    /// Index of the matched column in the schema
    pub column_index: usize,
    /// Key of the matched column
    pub column_key: String,
    /// Pass that produced the match
    pub kind: MatchKind,
}

/// Partial, injective mapping from external headers to columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    matches: Vec<HeaderMatch>,
}

impl ColumnMapping {
    /// Matches in header order.
    pub fn matches(&self) -> &[HeaderMatch] {
        &self.matches
    }

    /// Returns the header mapped to the column with `key`, if any.
    pub fn header_for(&self, key: &str) -> Option<&str> {
        self.matches
            .iter()
            .find(|m| m.column_key == key)
            .map(|m| m.header.as_str())
    }

    /// Returns the column key a header was mapped to, if any.
    pub fn column_for(&self, header: &str) -> Option<&str> {
        self.matches
            .iter()
            .find(|m| m.header == header)
            .map(|m| m.column_key.as_str())
    }

    /// Number of mapped headers.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Returns true when no header matched.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Matches `headers` against `columns`.
///
/// # Arguments
/// * `headers` - External headers in source order
/// * `columns` - Page columns in schema order
///
/// # Returns
/// A mapping in which each header and each column appears at most once.
/// Unmatched headers are simply absent.
pub fn reconcile<S: AsRef<str>>(headers: &[S], columns: &[Column]) -> ColumnMapping {
    let mut claimed = vec![false; columns.len()];
    let mut mapping = ColumnMapping::default();

    for header in headers {
        let header = header.as_ref();
        if mapping.column_for(header).is_some() {
            continue;
        }

        let found = find_exact(header, columns, &claimed)
            .map(|i| (i, MatchKind::Exact))
            .or_else(|| find_fuzzy(header, columns, &claimed).map(|i| (i, MatchKind::Fuzzy)));

        match found {
            Some((index, kind)) => {
                claimed[index] = true;
                tracing::debug!(
                    header,
                    column = %columns[index].key,
                    ?kind,
                    "Header matched"
                );
                mapping.matches.push(HeaderMatch {
                    header: header.to_string(),
                    column_index: index,
                    column_key: columns[index].key.clone(),
                    kind,
                });
            }
            None => tracing::debug!(header, "Header left unmapped"),
        }
    }

    mapping
}

fn find_exact(header: &str, columns: &[Column], claimed: &[bool]) -> Option<usize> {
    columns
        .iter()
        .enumerate()
        .find(|(i, c)| !claimed[*i] && (c.key == header || c.label == header))
        .map(|(i, _)| i)
}

fn find_fuzzy(header: &str, columns: &[Column], claimed: &[bool]) -> Option<usize> {
    let header = header.to_lowercase();
    columns
        .iter()
        .enumerate()
        .find(|(i, c)| {
            if claimed[*i] {
                return false;
            }
            let key = c.key.to_lowercase();
            let label = c.label.to_lowercase();
            key.contains(&header)
                || header.contains(&key)
                || label.contains(&header)
                || header.contains(&label)
        })
        .map(|(i, _)| i)
}
