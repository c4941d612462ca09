use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, MergeError>;

/// Error type covering the different failure cases that can occur when the
/// tool ingests, reconciles, or exports roster data.
#[derive(Debug, Error)]
pub enum MergeError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when CSV parsing or deserialization fails.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when a workbook does not follow the expected conventions.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when the roster database cannot be opened.
    #[error("database error: {0}")]
    Database(#[from] redb::DatabaseError),

    /// Raised when a database transaction cannot be started.
    #[error("transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    /// Raised when a database table cannot be opened.
    #[error("table error: {0}")]
    Table(#[from] redb::TableError),

    /// Raised when reading or writing database records fails.
    #[error("storage error: {0}")]
    Storage(#[from] redb::StorageError),

    /// Raised when a database transaction fails to commit.
    #[error("commit error: {0}")]
    Commit(#[from] redb::CommitError),

    /// Raised when a stored record cannot be encoded or decoded.
    #[error("record encoding error: {0}")]
    Encoding(#[from] postcard::Error),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when a required column is absent from an export file.
    #[error("missing column '{column}' in {file}")]
    MissingColumn { column: String, file: PathBuf },

    /// Raised when a cell value cannot be parsed into its typed form.
    #[error("invalid value '{value}' in column {column}")]
    InvalidCell { column: String, value: String },

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
