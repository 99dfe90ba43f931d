//! FILENAME: core/engine/src/grid.rs
//! PURPOSE: A sparse worksheet holding the source data of a pivot table.
//! CONTEXT: Source tables are usually placed on a sheet first and the pivot
//! cache is then built from an A1 range of that sheet. The grid uses a sparse
//! HashMap so that unset cells cost nothing and read back as `Empty`.

use std::collections::HashMap;

use crate::cell::CellValue;
use crate::coord::{CellCoord, CellRange};
use crate::table::Table;

#[derive(Debug, Clone, Default)]
pub struct Grid {
    /// Sparse storage keyed by 0-based (row, col).
    pub cells: HashMap<CellCoord, CellValue>,

    /// Highest row index currently in use.
    pub max_row: u32,

    /// Highest column index currently in use.
    pub max_col: u32,
}

impl Grid {
    pub fn new() -> Self {
        Grid::default()
    }

    /// Sets a cell. Storing `Empty` clears it.
    pub fn set_value(&mut self, row: u32, col: u32, value: CellValue) {
        if value.is_empty() {
            self.cells.remove(&(row, col));
            return;
        }
        self.max_row = self.max_row.max(row);
        self.max_col = self.max_col.max(col);
        self.cells.insert((row, col), value);
    }

    pub fn get_value(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.cells.get(&(row, col))
    }

    /// Writes `table` with its header row at `origin` and returns the range the
    /// header and data rows occupy.
    pub fn write_table(&mut self, table: &Table, origin: CellCoord) -> CellRange {
        let (top, left) = origin;
        for (col, header) in table.headers().iter().enumerate() {
            self.set_value(top, left + col as u32, CellValue::Text(header.clone()));
        }
        for (row_idx, row) in table.rows().iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                self.set_value(top + 1 + row_idx as u32, left + col as u32, value.clone());
            }
        }
        CellRange::from_origin(
            origin,
            table.row_count() as u32 + 1,
            table.column_count() as u32,
        )
    }

    /// Copies the values of `range` row by row. Unset cells read as `Empty`.
    pub fn read_range(&self, range: &CellRange) -> Vec<Vec<CellValue>> {
        (range.top_row()..=range.bottom_row())
            .map(|row| {
                (range.left_col()..=range.right_col())
                    .map(|col| self.get_value(row, col).cloned().unwrap_or_default())
                    .collect()
            })
            .collect()
    }
}
