//! FILENAME: core/engine/src/lib.rs
//! PURPOSE: Shared value types for the pivot workspace.
//! CONTEXT: Re-exports the cell, coordinate, grid and table types used by
//! `pivot-engine` and `persistence`.

pub mod cell;
pub mod coord;
pub mod error;
pub mod grid;
pub mod table;

// Re-export commonly used types at the crate root
pub use cell::{format_number, CellType, CellValue};
pub use coord::{a1_to_coord, col_to_index, coord_to_a1, index_to_col, CellCoord, CellRange};
pub use error::TableError;
pub use grid::Grid;
pub use table::{ColumnIndex, Table};
