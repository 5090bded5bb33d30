//! Classification of errors returned by the Google APIs.
//!
//! The hub crates mostly expose failures as HTTP statuses or JSON bodies, and
//! sometimes only as text. Everything that inspects them lives here.

use crate::error::SheetError;
use crate::sheets::retry::Attempt;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    NotFound,
    /// Rate limiting, server hiccups, transport failures.
    Transient,
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classify an error known only by its text.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(classify_message(&message), message)
    }

    /// Map into the result of one retry attempt, with `not_found` supplying the
    /// error for missing resources.
    pub fn into_attempt<T>(
        self,
        not_found: impl FnOnce() -> SheetError,
    ) -> Result<Attempt<T>, SheetError> {
        match self.kind {
            RemoteErrorKind::Transient => Ok(Attempt::NotReady(self.message)),
            RemoteErrorKind::NotFound => Err(not_found()),
            RemoteErrorKind::Fatal => Err(SheetError::RemoteFailure(self.message)),
        }
    }
}

impl From<google_sheets4::Error> for RemoteError {
    fn from(err: google_sheets4::Error) -> Self {
        use google_sheets4::Error;

        let kind = match &err {
            Error::HttpError(_) | Error::Io(_) => RemoteErrorKind::Transient,
            Error::Failure(response) => classify_status(response.status().as_u16()),
            Error::BadRequest(body) => classify_body(body),
            _ => classify_message(&err.to_string()),
        };
        Self::new(kind, err.to_string())
    }
}

pub fn classify_status(status: u16) -> RemoteErrorKind {
    match status {
        404 => RemoteErrorKind::NotFound,
        408 | 429 | 500..=599 => RemoteErrorKind::Transient,
        _ => RemoteErrorKind::Fatal,
    }
}

/// Google error bodies look like `{"error": {"code": 429, "status": "RESOURCE_EXHAUSTED", ...}}`.
fn classify_body(body: &Value) -> RemoteErrorKind {
    body.pointer("/error/code")
        .and_then(Value::as_u64)
        .and_then(|code| u16::try_from(code).ok())
        .map(classify_status)
        .unwrap_or_else(|| classify_message(&body.to_string()))
}

pub fn classify_message(message: &str) -> RemoteErrorKind {
    const NOT_FOUND_MARKERS: &[&str] = &["not found", "not_found", "response [404]"];
    const TRANSIENT_MARKERS: &[&str] = &[
        "resource_exhausted",
        "quota exceeded",
        "rate limit",
        "response [429]",
        "unavailable",
        "timed out",
        "backend error",
    ];

    let message = message.to_lowercase();
    if NOT_FOUND_MARKERS.iter().any(|m| message.contains(m)) {
        RemoteErrorKind::NotFound
    } else if TRANSIENT_MARKERS.iter().any(|m| message.contains(m)) {
        RemoteErrorKind::Transient
    } else {
        RemoteErrorKind::Fatal
    }
}
