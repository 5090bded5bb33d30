use super::{RemoteDocument, RemoteSheet, SheetOperations, Table};
use crate::error::{AppError, Result};
use crate::sheets::auth::create_and_verify_authenticator;
use crate::sheets::remote::{RemoteError, RemoteResult};
use async_trait::async_trait;
use google_drive3::api::DriveHub;
use google_sheets4::api::{Sheets, Spreadsheet};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use serde_json::Value;
use tracing::{debug, instrument};
use yup_oauth2::ServiceAccountKey;

// Read/write on spreadsheets, read-only on Drive for name lookups
pub(crate) const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
pub(crate) const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";
pub(crate) const AUTH_SCOPES: &[&str] = &[SPREADSHEETS_SCOPE, DRIVE_READONLY_SCOPE];

const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

type Connector = HttpsConnector<HttpConnector>;

pub struct SheetsClient {
    sheets: Sheets<Connector>,
    drive: DriveHub<Connector>,
}

impl SheetsClient {
    /// Create a new SheetsClient authorized as the given service account
    #[instrument(name = "Authenticating to Google Sheets", skip_all, fields(email = %key.client_email))]
    pub async fn new(key: ServiceAccountKey) -> Result<Self> {
        let auth = create_and_verify_authenticator(key).await?;

        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .map_err(|e| AppError::Auth(format!("Failed to load native TLS roots: {}", e)))?
            .https_or_http()
            .enable_http1()
            .build();

        let client = Client::builder(hyper_util::rt::TokioExecutor::new()).build(connector);

        Ok(Self {
            sheets: Sheets::new(client.clone(), auth.clone()),
            drive: DriveHub::new(client, auth),
        })
    }

    async fn get_spreadsheet(&self, id: &str) -> RemoteResult<Spreadsheet> {
        let (_, spreadsheet) = self
            .sheets
            .spreadsheets()
            .get(id)
            .include_grid_data(false)
            .add_scope(SPREADSHEETS_SCOPE)
            .doit()
            .await?;

        Ok(spreadsheet)
    }
}

#[async_trait]
impl SheetOperations for SheetsClient {
    #[instrument(name = "Finding spreadsheet by name", skip(self))]
    async fn find_document(
        &self,
        name: &str,
        folder: Option<&str>,
    ) -> RemoteResult<Option<String>> {
        let mut query = format!(
            "name='{}' and mimeType='{}' and trashed=false",
            escape_query(name),
            SPREADSHEET_MIME_TYPE
        );
        if let Some(folder) = folder {
            query.push_str(&format!(" and '{}' in parents", escape_query(folder)));
        }

        let (_, file_list) = self
            .drive
            .files()
            .list()
            .q(&query)
            .spaces("drive")
            .page_size(1)
            .add_scope(DRIVE_READONLY_SCOPE)
            .doit()
            .await
            .map_err(|e| RemoteError::from_message(format!("Failed to search spreadsheet: {}", e)))?;

        let spreadsheet_id = file_list
            .files
            .and_then(|files| files.into_iter().next())
            .and_then(|file| file.id);

        Ok(spreadsheet_id)
    }

    #[instrument(name = "Fetching spreadsheet", skip(self))]
    async fn open_document(&self, id: &str) -> RemoteResult<RemoteDocument> {
        let spreadsheet = self.get_spreadsheet(id).await?;
        let title = spreadsheet
            .properties
            .and_then(|props| props.title)
            .unwrap_or_default();
        debug!(%title, "Fetched spreadsheet");

        Ok(RemoteDocument {
            id: id.to_string(),
            title,
        })
    }

    #[instrument(name = "Listing sheets", skip_all, fields(document = %document.id))]
    async fn list_sheets(&self, document: &RemoteDocument) -> RemoteResult<Vec<RemoteSheet>> {
        let spreadsheet = self.get_spreadsheet(&document.id).await?;
        Ok(sheets_by_index(spreadsheet))
    }

    #[instrument(name = "Reading values", skip(self, document), fields(document = %document.id))]
    async fn read_values(&self, document: &RemoteDocument, range: &str) -> RemoteResult<Table> {
        let (_, response) = self
            .sheets
            .spreadsheets()
            .values_get(&document.id, range)
            .major_dimension("ROWS")
            .value_render_option("FORMATTED_VALUE")
            .add_scope(SPREADSHEETS_SCOPE)
            .doit()
            .await?;

        // Values are Option<Vec<Vec<serde_json::Value>>>
        let values = response
            .values
            .unwrap_or_default()
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect();

        Ok(values)
    }
}

fn sheets_by_index(spreadsheet: Spreadsheet) -> Vec<RemoteSheet> {
    let mut sheets: Vec<RemoteSheet> = spreadsheet
        .sheets
        .unwrap_or_default()
        .into_iter()
        .filter_map(|sheet| sheet.properties)
        .enumerate()
        .map(|(position, props)| RemoteSheet {
            sheet_id: props.sheet_id.unwrap_or_default(),
            title: props.title.unwrap_or_default(),
            index: props
                .index
                .and_then(|i| usize::try_from(i).ok())
                .unwrap_or(position),
        })
        .collect();
    sheets.sort_by_key(|sheet| sheet.index);
    sheets
}

fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
