//! FILENAME: core/pivot-engine/src/lib.rs
//! Pivot cache and layout subsystem.
//!
//! This crate turns a flat table into the structures a spreadsheet pivot
//! table needs. It depends on `engine` only for shared types (CellValue,
//! CellRange, Grid, Table).
//!
//! Layers:
//! - `definition`: Serializable configuration (what the pivot table IS)
//! - `cache`: Shared-value index (deduplicated values per column)
//! - `records`: Source rows encoded against the shared values
//! - `group`: Prefix sums per axis (HOW we aggregate)
//! - `layout`: Ordered positions and field items (WHAT we display)
//! - `ids`: Cache identifier allocation
//! - `engine`: The pipeline tying the layers together

pub mod cache;
pub mod definition;
pub mod engine;
pub mod error;
pub mod group;
pub mod ids;
pub mod layout;
pub mod records;

pub use cache::*;
pub use definition::*;
pub use self::engine::{calculate_pivot, table_from_range, PivotModel, PivotStats};
pub use error::PivotError;
pub use group::{GroupKey, GroupTable};
pub use ids::{reference_id, CacheIdAllocator};
pub use layout::*;
pub use records::{encode_records, encode_records_strict, ensure_indexed, Record, RecordCell};
