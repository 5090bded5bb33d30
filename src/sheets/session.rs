use super::range::{self, Cell, CellRange, CellRef};
use super::retry::{Attempt, RetryPolicy};
use super::{Authorizer, CredentialResolver, RemoteDocument, RemoteSheet, SheetOperations, Table};
use crate::error::SheetError;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, instrument};

type SheetResult<T> = Result<T, SheetError>;

/// The sheet most recently opened, kept together with its index so the two
/// can never disagree.
#[derive(Debug, Clone)]
struct OpenSheet {
    index: usize,
    sheet: RemoteSheet,
}

#[derive(Debug, Default)]
struct SessionState {
    document: Option<RemoteDocument>,
    sheet: Option<OpenSheet>,
}

/// Context for all sheet reads: credentials, retry policy and the currently
/// open document and sheet.
///
/// Every public operation resolves credentials first, so credential errors
/// take precedence over anything the remote would report. Each operation is
/// retried as a whole under the session's [`RetryPolicy`].
pub struct SheetSession<A: Authorizer> {
    resolver: CredentialResolver<A>,
    policy: RetryPolicy,
    state: Mutex<SessionState>,
}

impl<A: Authorizer> SheetSession<A> {
    pub fn new(resolver: CredentialResolver<A>, policy: RetryPolicy) -> Self {
        Self {
            resolver,
            policy,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn resolver(&self) -> &CredentialResolver<A> {
        &self.resolver
    }

    pub fn current_document(&self) -> Option<RemoteDocument> {
        self.lock().document.clone()
    }

    #[cfg(test)]
    pub fn current_sheet_index(&self) -> Option<usize> {
        self.lock().sheet.as_ref().map(|open| open.index)
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn client(&self) -> SheetResult<&A::Client> {
        Ok(&self.resolver.resolve().await?.client)
    }

    /// Look up a spreadsheet ID by its Drive file name.
    #[instrument(name = "Finding document", skip(self))]
    pub async fn find_document(&self, name: &str, folder: Option<&str>) -> SheetResult<String> {
        let missing = || SheetError::DocumentNotFound(name.to_string());

        self.policy
            .run(|| async move {
                let client = self.client().await?;
                match client.find_document(name, folder).await {
                    Ok(Some(id)) => Ok(Attempt::Ready(id)),
                    Ok(None) => Err(missing()),
                    Err(e) => e.into_attempt(missing),
                }
            })
            .await
    }

    /// Open a document by ID, forgetting any previously open sheet.
    #[instrument(name = "Opening document", skip(self))]
    pub async fn open_document(&self, id: &str) -> SheetResult<()> {
        self.policy
            .run(|| async move {
                let client = self.client().await?;
                match client.open_document(id).await {
                    Ok(document) => {
                        debug!(title = %document.title, "Opened document");
                        let mut state = self.lock();
                        state.document = Some(document);
                        state.sheet = None;
                        Ok(Attempt::Ready(()))
                    }
                    Err(e) => e.into_attempt(|| SheetError::DocumentNotFound(id.to_string())),
                }
            })
            .await
    }

    /// Make the sheet at `index` the current one. No remote call when it
    /// already is.
    #[instrument(name = "Opening sheet", skip(self))]
    pub async fn ensure_sheet_open(&self, index: usize) -> SheetResult<RemoteSheet> {
        self.policy
            .run(|| async move {
                self.client().await?;
                Ok(self.try_open_sheet(index).await?.map(|(_, sheet)| sheet))
            })
            .await
    }

    /// All values of the sheet at `index`, row-major. Every row is padded
    /// with empty cells to the width of the widest row.
    #[instrument(name = "Reading sheet", skip(self))]
    pub async fn get_sheet(&self, index: usize) -> SheetResult<Table> {
        self.policy
            .run(|| async move {
                let client = self.client().await?;
                let values = self.read_sheet_values(client, index, None).await?;
                Ok(values.map(pad_rows))
            })
            .await
    }

    /// Every cell of an A1 range such as `A1:C3`, row-major.
    #[instrument(name = "Reading cell range", skip(self))]
    pub async fn get_cell_range(&self, index: usize, range: &str) -> SheetResult<Vec<Cell>> {
        self.policy
            .run(|| async move {
                let client = self.client().await?;
                let range = CellRange::parse(range)?;
                let values = self.read_sheet_values(client, index, Some(range)).await?;
                Ok(values.map(|values| range.cells(&values)))
            })
            .await
    }

    /// A single cell, 1-based.
    #[instrument(name = "Reading cell", skip(self))]
    pub async fn get_cell(&self, index: usize, row: u32, col: u32) -> SheetResult<Cell> {
        self.policy
            .run(|| async move {
                let client = self.client().await?;
                let range = CellRange::single(CellRef::new(row, col)?);
                let values = self.read_sheet_values(client, index, Some(range)).await?;
                Ok(values.map(|values| Cell {
                    row,
                    col,
                    value: values
                        .first()
                        .and_then(|r| r.first())
                        .cloned()
                        .unwrap_or_default(),
                }))
            })
            .await
    }

    async fn try_open_sheet(
        &self,
        index: usize,
    ) -> SheetResult<Attempt<(RemoteDocument, RemoteSheet)>> {
        let document = {
            let state = self.lock();
            let document = state.document.clone().ok_or(SheetError::NoDocumentOpen)?;
            if let Some(open) = state.sheet.as_ref().filter(|open| open.index == index) {
                return Ok(Attempt::Ready((document, open.sheet.clone())));
            }
            document
        };

        let client = self.client().await?;
        let sheets = match client.list_sheets(&document).await {
            Ok(sheets) => sheets,
            Err(e) => {
                return e.into_attempt(|| SheetError::DocumentNotFound(document.id.clone()));
            }
        };
        let sheet = sheets
            .into_iter()
            .nth(index)
            .ok_or(SheetError::SheetIndexNotFound(index))?;
        debug!(title = %sheet.title, sheet_id = sheet.sheet_id, "Opened sheet");

        let mut state = self.lock();
        if state.document.as_ref() == Some(&document) {
            state.sheet = Some(OpenSheet {
                index,
                sheet: sheet.clone(),
            });
        }
        Ok(Attempt::Ready((document, sheet)))
    }

    async fn read_sheet_values(
        &self,
        client: &A::Client,
        index: usize,
        range: Option<CellRange>,
    ) -> SheetResult<Attempt<Table>> {
        let (document, sheet) = match self.try_open_sheet(index).await? {
            Attempt::Ready(open) => open,
            Attempt::NotReady(reason) => return Ok(Attempt::NotReady(reason)),
        };

        let a1 = match range {
            Some(range) => range.qualified(&sheet.title),
            None => range::quote_sheet_title(&sheet.title),
        };
        match client.read_values(&document, &a1).await {
            Ok(values) => Ok(Attempt::Ready(values)),
            Err(e) => e.into_attempt(|| SheetError::SheetIndexNotFound(index)),
        }
    }
}

/// The API trims trailing empty cells from each row.
fn pad_rows(mut table: Table) -> Table {
    let width = table.iter().map(Vec::len).max().unwrap_or_default();
    for row in &mut table {
        row.resize(width, String::new());
    }
    table
}
