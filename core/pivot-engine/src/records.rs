//! FILENAME: core/pivot-engine/src/records.rs
//! Record Encoder - rewrites table rows as indices into the shared items.

use engine::Table;
use serde::{Deserialize, Serialize};

use crate::cache::{CacheValue, SharedValueIndex, ValueId};
use crate::error::PivotError;

/// One encoded cell of a cache record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecordCell {
    /// Position of the value in the column's shared items.
    Indexed(ValueId),
    /// The value itself, for cells missing from the shared items.
    Literal(CacheValue),
}

/// One encoded table row.
pub type Record = Vec<RecordCell>;

/// Encodes every row of `table` against `index`, in row order.
///
/// A cell whose value is not in its column's shared items is kept as a
/// literal. That only happens when the index was built from a different
/// snapshot of the table.
pub fn encode_records(table: &Table, index: &SharedValueIndex) -> Vec<Record> {
    let mut literals = 0usize;
    let records: Vec<Record> = table
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(col, cell)| match index.index_of(col, cell) {
                    Some(id) => RecordCell::Indexed(id),
                    None => {
                        literals += 1;
                        RecordCell::Literal(CacheValue::from(cell))
                    }
                })
                .collect()
        })
        .collect();

    if literals > 0 {
        log::warn!(
            "{} record cell(s) are not in the shared items and were encoded as literals",
            literals
        );
    }
    records
}

/// Rejects any literal cell with `DataConsistency`.
pub fn ensure_indexed(records: &[Record], headers: &[String]) -> Result<(), PivotError> {
    for (row, record) in records.iter().enumerate() {
        if let Some(col) = record
            .iter()
            .position(|cell| matches!(cell, RecordCell::Literal(_)))
        {
            return Err(PivotError::DataConsistency {
                row,
                column: headers.get(col).cloned().unwrap_or_default(),
            });
        }
    }
    Ok(())
}

/// Encodes and checks in one step. This is what the pipeline uses.
pub fn encode_records_strict(table: &Table, index: &SharedValueIndex) -> Result<Vec<Record>, PivotError> {
    let records = encode_records(table, index);
    ensure_indexed(&records, table.headers())?;
    Ok(records)
}
