//! Error types for the table transforms.

use thiserror::Error;

/// Failures of the projection, merge and derivation operations.
///
/// Every variant is fatal to the current job: no partially built table is
/// ever returned alongside one of these.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    /// A declared field never appears in the result set, or two tables
    /// being merged disagree on their columns.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("field spec is empty")]
    EmptyFieldSpec,

    #[error("column `{0}` not found")]
    ColumnNotFound(String),

    #[error("column `{0}` would appear more than once")]
    DuplicateColumn(String),

    #[error("no tables to merge")]
    NoTables,
}

pub type Result<T> = std::result::Result<T, TableError>;
