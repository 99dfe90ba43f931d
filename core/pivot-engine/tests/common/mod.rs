//! FILENAME: tests/common/mod.rs
//! Fixtures shared by the pivot-engine integration tests.

#![allow(dead_code)]

use engine::{CellValue, Table};
use pivot_engine::AxisSpec;

/// A photo-sharing account summary: one row per account and genre.
pub struct PhotoFixture;

impl PhotoFixture {
    pub fn headers() -> Vec<&'static str> {
        vec!["Account", "Genre", "Images", "Average Ranking", "Total Size"]
    }

    pub fn data() -> Vec<(&'static str, &'static str, f64, f64, f64)> {
        vec![
            ("Megan", "Floral", 20.0, 4.5, 72000.0),
            ("Daniel", "Portraits", 31.0, 3.2, 85000.0),
            ("Hannah", "Landscapes", 12.0, 4.0, 40000.0),
            ("Vicky", "Floral", 8.0, 2.5, 21000.0),
            ("Ian", "Portraits", 15.0, 3.8, 50000.0),
            ("Michael", "Landscapes", 27.0, 4.9, 90000.0),
            ("Megan", "Portraits", 5.0, 3.0, 10000.0),
            ("Hannah", "Floral", 9.0, 3.5, 18000.0),
            ("Daniel", "Landscapes", 14.0, 4.1, 33000.0),
            ("Vicky", "Portraits", 11.0, 2.9, 26000.0),
            ("Ian", "Floral", 6.0, 3.3, 12000.0),
            ("Michael", "Floral", 18.0, 4.4, 61000.0),
        ]
    }

    pub fn table() -> Table {
        let headers = Self::headers().into_iter().map(String::from).collect();
        let rows = Self::data()
            .into_iter()
            .map(|(account, genre, images, ranking, size)| {
                vec![
                    CellValue::from(account),
                    CellValue::from(genre),
                    CellValue::Number(images),
                    CellValue::Number(ranking),
                    CellValue::Number(size),
                ]
            })
            .collect();
        Table::new(headers, rows).unwrap()
    }

    pub const TOTAL_SIZE: f64 = 518000.0;
    pub const TOTAL_IMAGES: f64 = 176.0;
}

/// The two-row table used by the small worked scenarios.
pub fn two_row_table() -> Table {
    Table::new(
        vec!["Account".into(), "Genre".into(), "Images".into(), "Size".into()],
        vec![
            vec!["Megan".into(), "Floral".into(), 20.into(), 72000.into()],
            vec!["Daniel".into(), "Portraits".into(), 31.into(), 85000.into()],
        ],
    )
    .unwrap()
}

pub fn spec(names: &[&str]) -> AxisSpec {
    names.iter().copied().collect()
}

/// Assert two sums are equal within rounding.
pub fn assert_sum(actual: Option<f64>, expected: f64) {
    match actual {
        Some(n) => assert!(
            (n - expected).abs() < 0.001,
            "expected {} but got {}",
            expected,
            n
        ),
        None => panic!("expected {} but the key is missing", expected),
    }
}
