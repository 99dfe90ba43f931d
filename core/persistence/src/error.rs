//! FILENAME: core/persistence/src/error.rs

use pivot_engine::PivotError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Pivot error: {0}")]
    Pivot(#[from] PivotError),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    #[error("Part not found: {0}")]
    MissingPart(String),
}
