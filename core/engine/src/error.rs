//! FILENAME: core/engine/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("Row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Duplicate column header: {0}")]
    DuplicateHeader(String),

    #[error("Column {0} has an empty header")]
    EmptyHeader(usize),

    #[error("Invalid cell range: {0}")]
    InvalidRange(String),
}
