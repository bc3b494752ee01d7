use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, TallyError>;

/// Error type covering the failures a tally run can hit while fetching remote
/// cells, persisting ledgers, or loading its configuration.
#[derive(Debug, Error)]
pub enum TallyError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Transport failures talking to the remote spreadsheet service.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote service answered with a non-success status.
    #[error("remote spreadsheet returned {status}: {body}")]
    RemoteStatus { status: u16, body: String },

    /// No worksheet title contains the date pattern for the run.
    #[error("no worksheet title contains '{0}'")]
    WorksheetNotFound(String),

    /// A persisted ledger does not follow the expected layout.
    #[error("invalid ledger {path}: {reason}")]
    InvalidLedger { path: PathBuf, reason: String },

    /// Raised when neither an API key nor a bearer token is available.
    #[error("missing credentials: {0}")]
    MissingCredentials(String),

    /// Raised when the configuration document is inconsistent.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl TallyError {
    pub(crate) fn invalid_ledger(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        TallyError::InvalidLedger {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
