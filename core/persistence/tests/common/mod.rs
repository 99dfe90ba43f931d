//! FILENAME: tests/common/mod.rs
//! Fixtures shared by the persistence integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use engine::{CellRange, CellValue, Grid, Table};
use persistence::CacheDefinitionOptions;
use pivot_engine::AxisSpec;

/// Fruit sales per region. Regions first appear as North, South, East.
pub fn sales_table() -> Table {
    let rows = [
        ("North", "Apples", 10.0, 120.5),
        ("South", "Pears", 4.0, 36.0),
        ("North", "Pears", 7.0, 63.0),
        ("East", "Apples", 3.0, 36.0),
        ("South", "Apples", 8.0, 96.0),
    ]
    .into_iter()
    .map(|(region, product, units, revenue)| {
        vec![
            CellValue::from(region),
            CellValue::from(product),
            CellValue::Number(units),
            CellValue::Number(revenue),
        ]
    })
    .collect();

    Table::new(
        vec!["Region".into(), "Product".into(), "Units".into(), "Revenue".into()],
        rows,
    )
    .unwrap()
}

pub const TOTAL_REVENUE: f64 = 351.5;

/// The sales table placed on a sheet at A1.
pub fn sales_grid() -> (Grid, CellRange) {
    let mut grid = Grid::new();
    let range = grid.write_table(&sales_table(), (0, 0));
    (grid, range)
}

pub fn fixed_options() -> CacheDefinitionOptions {
    CacheDefinitionOptions {
        refreshed_by: "Test Suite".to_string(),
        refreshed_date: NaiveDate::from_ymd_opt(2014, 10, 22).and_then(|d| d.and_hms_opt(19, 30, 0)),
    }
}

pub fn spec(names: &[&str]) -> AxisSpec {
    names.iter().copied().collect()
}
