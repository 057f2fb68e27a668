use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlorinError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Could not read {file_type} statement {file_name}: {message}")]
    ParseFailure {
        file_name: String,
        file_type: String,
        message: String,
    },

    #[error("No transactions found in {file_name} ({file_type}, {file_size} bytes)")]
    NoTransactionsFound {
        file_name: String,
        file_type: String,
        file_size: usize,
    },

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, FlorinError>;
