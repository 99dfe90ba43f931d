//! FILENAME: core/engine/src/table.rs
//! PURPOSE: The immutable source table a pivot table is built from.
//! CONTEXT: A header row of unique column names followed by rows of equal
//! length. Every pivot stage reads the table; none of them mutate it.

use serde::Serialize;

use crate::cell::CellValue;
use crate::coord::CellRange;
use crate::error::TableError;
use crate::grid::Grid;

/// Index of a column within a table (0-based).
pub type ColumnIndex = usize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Creates a table, checking that headers are unique and non-empty and that
    /// every row has exactly one cell per header.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self, TableError> {
        for (i, header) in headers.iter().enumerate() {
            if header.is_empty() {
                return Err(TableError::EmptyHeader(i));
            }
            if headers[..i].contains(header) {
                return Err(TableError::DuplicateHeader(header.clone()));
            }
        }

        for (i, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(TableError::RaggedRow {
                    row: i,
                    expected: headers.len(),
                    found: row.len(),
                });
            }
        }

        Ok(Table { headers, rows })
    }

    /// Reads a table from a sheet range whose first row holds the headers.
    pub fn from_grid(grid: &Grid, range: &CellRange) -> Result<Self, TableError> {
        let mut values = grid.read_range(range);
        if values.is_empty() {
            return Err(TableError::InvalidRange(range.to_string()));
        }
        let headers = values
            .remove(0)
            .iter()
            .map(|v| v.display_value())
            .collect();
        Table::new(headers, values)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Position of the column called `name`.
    pub fn column_index(&self, name: &str) -> Option<ColumnIndex> {
        self.headers.iter().position(|h| h == name)
    }

    /// Iterates the values of one column in row order.
    pub fn column(&self, index: ColumnIndex) -> impl Iterator<Item = &CellValue> + '_ {
        self.rows.iter().filter_map(move |row| row.get(index))
    }
}
