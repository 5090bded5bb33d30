use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by the sheet access layer.
///
/// Lower layers return these verbatim; nothing above the session rewraps them,
/// so the driver can point the user at a specific fix.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SheetError {
    #[error("no credentials file found at {0:?}")]
    NoCredentialsFile(PathBuf),

    #[error("credentials rejected: {0}")]
    InvalidCredentials(String),

    #[error("remote still not ready after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    #[error("no document is open")]
    NoDocumentOpen,

    #[error("sheet index {0} not found in the open document")]
    SheetIndexNotFound(usize),

    #[error("document not found: {0}")]
    DocumentNotFound(String),

    #[error("invalid cell range {0:?}")]
    InvalidRange(String),

    #[error("remote request failed: {0}")]
    RemoteFailure(String),

    #[error("cancelled while waiting to retry")]
    Cancelled,
}

impl SheetError {
    /// Short hint telling the operator what to do about the error.
    pub fn remediation(&self) -> &'static str {
        match self {
            SheetError::NoCredentialsFile(_) => {
                "place credentials.json next to the executable or set google.credentials_path"
            }
            SheetError::InvalidCredentials(_) => {
                "check the service account key and that it has not been revoked"
            }
            SheetError::RetriesExhausted { .. } => {
                "the API quota is still exhausted; try again later"
            }
            SheetError::NoDocumentOpen => "open a document before reading sheets",
            SheetError::SheetIndexNotFound(_) => "check the sheet index configured for the document",
            SheetError::DocumentNotFound(_) => {
                "check the document ID and that it is shared with the service account"
            }
            SheetError::InvalidRange(_) => "use an A1 range such as A1:C3",
            SheetError::RemoteFailure(_) => "see the error message returned by Google",
            SheetError::Cancelled => "the operation was aborted",
        }
    }
}

/// Failures reading or rewriting a localization record file.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("failed to read record file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse record file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write record file {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Google Sheets error: {0}")]
    Sheets(#[from] SheetError),

    #[error("Localization record error: {0}")]
    Record(#[from] RecordError),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Packaging tool error: {0}")]
    Packaging(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
