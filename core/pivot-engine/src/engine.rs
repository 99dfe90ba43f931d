//! FILENAME: core/pivot-engine/src/engine.rs
//! Pivot Engine - runs the whole pipeline for one pivot table.
//!
//! Algorithm:
//! 1. Build the shared-value index from the source table
//! 2. Resolve the axis specifications (defaults, unknown fields, overlaps)
//! 3. Encode the records and reject any that miss the shared items
//! 4. Group the row axis and the column axis independently
//! 5. Lay out positions, field items, data fields and location

use engine::{CellRange, Grid, Table};
use serde::Serialize;

use crate::cache::SharedValueIndex;
use crate::definition::{PivotDefinition, ResolvedAxes};
use crate::error::PivotError;
use crate::group::GroupTable;
use crate::layout::{build_layout, PivotLayout};
use crate::records::{encode_records_strict, Record};

/// Everything needed to write the pivot cache and pivot table parts.
#[derive(Debug, Clone)]
pub struct PivotModel {
    pub headers: Vec<String>,
    pub index: SharedValueIndex,
    pub records: Vec<Record>,
    pub axes: ResolvedAxes,
    pub row_groups: GroupTable,
    pub column_groups: GroupTable,
    pub layout: PivotLayout,
}

impl PivotModel {
    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

/// Summary figures of a calculated pivot, handy for logs and hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PivotStats {
    pub records: usize,
    pub row_positions: usize,
    pub column_positions: usize,
    pub data_fields: usize,
}

impl From<&PivotModel> for PivotStats {
    fn from(model: &PivotModel) -> Self {
        PivotStats {
            records: model.records.len(),
            row_positions: model.layout.rows.positions.len(),
            column_positions: model.layout.columns.positions.len(),
            data_fields: model.layout.data_fields.len(),
        }
    }
}

/// Calculates a pivot table over `table`.
pub fn calculate_pivot(table: &Table, definition: &PivotDefinition) -> Result<PivotModel, PivotError> {
    let index = SharedValueIndex::build(table)?;
    let axes = ResolvedAxes::resolve(table.headers(), definition)?;
    let records = encode_records_strict(table, &index)?;

    let row_groups = GroupTable::from_resolved(table, &axes.rows, &axes.values);
    let column_groups = GroupTable::from_resolved(table, &axes.columns, &axes.values);
    let layout = build_layout(definition, &index, &axes, &row_groups, &column_groups);

    Ok(PivotModel {
        headers: table.headers().to_vec(),
        index,
        records,
        axes,
        row_groups,
        column_groups,
        layout,
    })
}

/// Cuts the source table out of a sheet. The first row of `range` is the header row.
pub fn table_from_range(grid: &Grid, range: &CellRange) -> Result<Table, PivotError> {
    if range.height() < 2 {
        return Err(PivotError::EmptyRange);
    }
    Ok(Table::from_grid(grid, range)?)
}
