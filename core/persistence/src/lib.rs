//! FILENAME: core/persistence/src/lib.rs
//! Pivot Persistence Module
//!
//! Renders pivot caches and pivot tables as Office Open XML parts and reads
//! cache parts back.
//!
//! - `cache_writer`: pivotCacheDefinition and pivotCacheRecords parts
//! - `table_writer`: pivotTableDefinition part
//! - `cache_reader`: parses cache parts into typed values
//! - `package`: id assignment and part registry for one document

mod cache_reader;
mod cache_writer;
mod error;
mod package;
mod table_writer;
mod xml;

pub use cache_reader::{read_cache_definition, read_cache_records, CacheDefinitionPart, CacheFieldPart};
pub use cache_writer::{write_cache_definition, write_cache_records, CacheDefinitionOptions};
pub use error::PersistenceError;
pub use package::{
    cache_definition_path, cache_records_path, pivot_table_path, PackagePart, PivotPackage, PivotTableEntry,
};
pub use table_writer::write_pivot_table;
