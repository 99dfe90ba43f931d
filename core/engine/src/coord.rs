//! FILENAME: core/engine/src/coord.rs
//! PURPOSE: Conversions between A1-style references and 0-based coordinates.
//! CONTEXT: Pivot caches record their source as an A1 range ("B2:F8") and pivot
//! tables record their location the same way. Column "A" = 0, row "1" = 0.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TableError;

/// A cell coordinate as (row, col) with 0-based indices.
pub type CellCoord = (u32, u32);

/// Converts a column string ("A", "AA") to a 0-based column index.
/// Returns `None` for empty or non-alphabetic input.
pub fn col_to_index(col_str: &str) -> Option<u32> {
    if col_str.is_empty() {
        return None;
    }
    let mut result: u32 = 0;
    for c in col_str.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
        result = result.checked_mul(26)?.checked_add(digit)?;
    }
    Some(result - 1)
}

/// Converts a 0-based column index to its letters: 0 -> "A", 26 -> "AA".
pub fn index_to_col(mut col_index: u32) -> String {
    let mut result = String::new();
    loop {
        let remainder = col_index % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if col_index < 26 {
            break;
        }
        col_index = col_index / 26 - 1;
    }
    result
}

/// Formats a 0-based coordinate as an A1 reference: (1, 1) -> "B2".
pub fn coord_to_a1(coord: CellCoord) -> String {
    let (row, col) = coord;
    format!("{}{}", index_to_col(col), row + 1)
}

/// Parses an A1 reference ("B2", "$B$2") into a 0-based coordinate.
pub fn a1_to_coord(reference: &str) -> Result<CellCoord, TableError> {
    let cleaned: String = reference.trim().chars().filter(|c| *c != '$').collect();
    let split = cleaned
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(|| TableError::InvalidRange(reference.to_string()))?;
    let (letters, digits) = cleaned.split_at(split);

    let col = col_to_index(letters).ok_or_else(|| TableError::InvalidRange(reference.to_string()))?;
    let row: u32 = digits
        .parse()
        .map_err(|_| TableError::InvalidRange(reference.to_string()))?;
    if row == 0 {
        return Err(TableError::InvalidRange(reference.to_string()));
    }
    Ok((row - 1, col))
}

// ============================================================================
// CELL RANGE
// ============================================================================

/// An inclusive rectangular block of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRange {
    pub start: CellCoord,
    pub end: CellCoord,
}

impl CellRange {
    /// Builds a range from any two corners.
    pub fn new(a: CellCoord, b: CellCoord) -> Self {
        CellRange {
            start: (a.0.min(b.0), a.1.min(b.1)),
            end: (a.0.max(b.0), a.1.max(b.1)),
        }
    }

    /// Builds the range of `height` rows by `width` columns whose top-left is `origin`.
    /// Both dimensions are clamped to at least one cell.
    pub fn from_origin(origin: CellCoord, height: u32, width: u32) -> Self {
        CellRange {
            start: origin,
            end: (
                origin.0 + height.max(1) - 1,
                origin.1 + width.max(1) - 1,
            ),
        }
    }

    pub fn top_row(&self) -> u32 {
        self.start.0
    }

    pub fn left_col(&self) -> u32 {
        self.start.1
    }

    pub fn bottom_row(&self) -> u32 {
        self.end.0
    }

    pub fn right_col(&self) -> u32 {
        self.end.1
    }

    pub fn height(&self) -> u32 {
        self.end.0 - self.start.0 + 1
    }

    pub fn width(&self) -> u32 {
        self.end.1 - self.start.1 + 1
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", coord_to_a1(self.start), coord_to_a1(self.end))
    }
}

impl FromStr for CellRange {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((a, b)) => Ok(CellRange::new(a1_to_coord(a)?, a1_to_coord(b)?)),
            None => {
                let single = a1_to_coord(s)?;
                Ok(CellRange::new(single, single))
            }
        }
    }
}
