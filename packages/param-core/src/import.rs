//! Import merge: reconciled, coerced rows appended to a page's records.

use std::collections::HashSet;

use crate::coercion::coerce;
use crate::ids::{import_id, IdGenerator};
use crate::reconcile::{reconcile, ColumnMapping};
use crate::record::Record;
use crate::schema::Column;
use crate::tabular::TabularRow;

/// Result of merging an import batch.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    /// Existing records followed by the new ones
    pub records: Vec<Record>,
    /// Number of records created, one per input row
    pub imported: usize,
    /// Header assignments used for the batch
    pub mapping: ColumnMapping,
}

/// Converts `rows` to records for `columns` and appends them after `existing`.
///
/// Every row yields exactly one record with a fresh id that collides with
/// no existing id and no other id of the batch. Mapped cells are coerced to
/// their column type; unmapped columns get the type default. Existing
/// records are never modified or replaced.
///
/// # Arguments
/// * `rows` - Decoded data rows
/// * `headers` - Decoded headers in source order
/// * `columns` - Target page columns
/// * `existing` - Current records of the page
/// * `ids` - Seed source for new ids
pub fn import_records<S: AsRef<str>>(
    rows: &[TabularRow],
    headers: &[S],
    columns: &[Column],
    existing: &[Record],
    ids: &IdGenerator,
) -> ImportOutcome {
    let mapping = reconcile(headers, columns);
    let sources: Vec<Option<&str>> = columns
        .iter()
        .map(|c| mapping.header_for(&c.key))
        .collect();

    let taken: HashSet<&str> = existing.iter().map(|r| r.id.as_str()).collect();
    let seed = batch_seed(ids, &taken, rows.len());

    let mut records = Vec::with_capacity(existing.len() + rows.len());
    records.extend_from_slice(existing);

    for (index, row) in rows.iter().enumerate() {
        let mut record = Record::new(import_id(seed, index));
        for (column, source) in columns.iter().zip(&sources) {
            let value = match source.and_then(|header| row.get(header)) {
                Some(raw) => coerce(Some(raw), column.column_type),
                None => column.default_value(),
            };
            record.set(column.key.clone(), value);
        }
        records.push(record);
    }

    ImportOutcome {
        records,
        imported: rows.len(),
        mapping,
    }
}

/// Picks a seed whose batch ids avoid every taken id.
fn batch_seed(ids: &IdGenerator, taken: &HashSet<&str>, count: usize) -> i64 {
    loop {
        let seed = ids.next_seed();
        if (0..count).all(|i| !taken.contains(import_id(seed, i).as_str())) {
            return seed;
        }
        tracing::debug!(seed, "Import id seed collides with existing records, retrying");
    }
}
