//! FILENAME: core/pivot-engine/src/error.rs

use engine::TableError;
use thiserror::Error;

use crate::definition::Axis;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PivotError {
    #[error("The source range contains no data rows")]
    EmptyRange,

    #[error("The {axis} axis references an unknown field: {name}")]
    UnknownField { axis: Axis, name: String },

    #[error("Fields are assigned to more than one axis: {}", names.join(","))]
    OverlappingFields { names: Vec<String> },

    #[error("Row {row}: value in column '{column}' is missing from the shared items")]
    DataConsistency { row: usize, column: String },

    #[error("Table error: {0}")]
    Table(#[from] TableError),
}
