use thiserror::Error;

#[derive(Error, Debug)]
pub enum SalesError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Could not identify product/code and quantity columns in header: {0}")]
    UnparseableHeader(String),

    #[error("Unknown client: {0}")]
    UnknownClient(String),

    #[error("Unknown period: {0}")]
    UnknownPeriod(String),

    #[error("Another import is already in progress")]
    ImportInProgress,

    #[error("Invalid import state: {0}")]
    InvalidState(String),

    #[error("Store failure: {0}")]
    StoreFailure(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SalesError>;
