use chainpeek_decode::DecodeError;

/// Errors from a row source.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested row key does not exist.
    #[error("row {key:?} not found")]
    NotFound { key: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A dump file line could not be parsed.
    #[error("invalid dump line {line}: {message}")]
    InvalidDump { line: usize, message: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors while projecting rows. Any of these aborts the scan.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("decoding column {column} of row {key:?}: {source}")]
    Decode {
        key: String,
        column: String,
        source: DecodeError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}
