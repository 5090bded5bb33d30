mod auth;
mod client;
#[cfg(test)]
pub(crate) mod mocks;
pub mod range;
pub mod remote;
pub mod retry;
mod session;

pub use auth::{Authorizer, CredentialResolver, CredentialSource, GoogleAuthorizer};
pub use retry::{CancelHandle, RetryPolicy};
pub use session::SheetSession;

// Re-export clear_tokens for CLI usage
pub use auth::clear_tokens as clear_sheets_tokens;

use async_trait::async_trait;
use remote::RemoteResult;

/// Rows of cell strings, as read from a sheet.
pub type Table = Vec<Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDocument {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSheet {
    pub sheet_id: i32,
    pub title: String,
    /// Zero-based position within the document.
    pub index: usize,
}

/// Remote calls the session needs from an authorized client.
#[async_trait]
pub trait SheetOperations: Send + Sync {
    /// Look up a spreadsheet ID by file name, optionally within a Drive folder.
    async fn find_document(&self, name: &str, folder: Option<&str>)
    -> RemoteResult<Option<String>>;

    async fn open_document(&self, id: &str) -> RemoteResult<RemoteDocument>;

    /// Sheets of the document, ordered by index.
    async fn list_sheets(&self, document: &RemoteDocument) -> RemoteResult<Vec<RemoteSheet>>;

    /// Formatted values of an A1 range, row-major.
    async fn read_values(&self, document: &RemoteDocument, range: &str) -> RemoteResult<Table>;
}
