use super::SheetOperations;
use crate::config::{Config, GoogleConfig};
use crate::error::{AppError, Result, SheetError};
use crate::sheets::client::{AUTH_SCOPES, SheetsClient};
use async_trait::async_trait;
use hyper_util::client::legacy::connect::HttpConnector;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};
use yup_oauth2::{
    ServiceAccountAuthenticator, ServiceAccountKey, authenticator::Authenticator,
    hyper_rustls::HttpsConnector,
};

const CREDENTIALS_FILE_NAME: &str = "credentials.json";

type AuthType = Authenticator<HttpsConnector<HttpConnector>>;

/// Create and verify authenticator by fetching a token
pub(super) async fn create_and_verify_authenticator(key: ServiceAccountKey) -> Result<AuthType> {
    let token_cache_path = Config::cache_file(&token_cache_name(&key.client_email))?;

    let auth = ServiceAccountAuthenticator::builder(key)
        .persist_tokens_to_disk(token_cache_path)
        .build()
        .await
        .map_err(|e| AppError::Auth(format!("Failed to build authenticator: {}", e)))?;

    // Trigger authentication by requesting a token
    let _token = auth
        .token(AUTH_SCOPES)
        .await
        .map_err(|e| AppError::Auth(format!("Failed to get token: {}", e)))?;

    Ok(auth)
}

/// Clear cached Google tokens for every service account
#[instrument(name = "Clearing auth tokens for Google Sheets", skip_all)]
pub fn clear_tokens() -> Result<()> {
    let cache_file = Config::cache_file(&token_cache_name(""))?;
    let Some(cache_dir) = cache_file.parent() else {
        return Ok(());
    };
    let entries = match fs::read_dir(cache_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No Google Sheets tokens to clear");
            return Ok(());
        }
        Err(e) => return Err(AppError::Auth(format!("Failed to read cache dir: {}", e))),
    };

    let mut cleared = 0;
    for entry in entries.flatten() {
        let name = entry.file_name();
        if !is_token_cache_name(&name.to_string_lossy()) {
            continue;
        }
        fs::remove_file(entry.path())
            .map_err(|e| AppError::Auth(format!("Failed to delete tokens file: {}", e)))?;
        cleared += 1;
    }
    debug!(cleared, "Cleared Google Sheets cached tokens");

    Ok(())
}

const TOKEN_CACHE_PREFIX: &str = "google_tokens-";

/// Token cache file for one service account. The authenticator keys stored
/// tokens by scope only, so accounts must not share a file.
fn token_cache_name(client_email: &str) -> String {
    let account: String = client_email
        .chars()
        .map(|c| match c.is_ascii_alphanumeric() || "@.-_".contains(c) {
            true => c,
            false => '_',
        })
        .collect();
    format!("{}{}.json", TOKEN_CACHE_PREFIX, account)
}

fn is_token_cache_name(name: &str) -> bool {
    name.starts_with(TOKEN_CACHE_PREFIX) && name.ends_with(".json")
}

/// Turns a service account key into an authorized client.
#[async_trait]
pub trait Authorizer: Send + Sync {
    type Client: SheetOperations;

    async fn authorize(&self, key: ServiceAccountKey) -> Result<Self::Client>;
}

pub struct GoogleAuthorizer;

#[async_trait]
impl Authorizer for GoogleAuthorizer {
    type Client = SheetsClient;

    async fn authorize(&self, key: ServiceAccountKey) -> Result<SheetsClient> {
        SheetsClient::new(key).await
    }
}

/// Where the service account key comes from.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    Embedded(Box<ServiceAccountKey>),
    File(PathBuf),
}

pub struct Authorized<C> {
    pub client: C,
    pub email: String,
}

/// Resolves credentials once and keeps the authorized client for reuse.
pub struct CredentialResolver<A: Authorizer> {
    authorizer: A,
    embedded: Option<ServiceAccountKey>,
    path: PathBuf,
    authorized: OnceCell<Authorized<A::Client>>,
}

impl<A: Authorizer> CredentialResolver<A> {
    pub fn new(authorizer: A, config: &GoogleConfig) -> Self {
        Self {
            authorizer,
            embedded: config.service_account.clone(),
            path: normalize_credentials_path(&config.credentials_path()),
            authorized: OnceCell::new(),
        }
    }

    /// Point at a key file, or at a directory holding `credentials.json`.
    ///
    /// The path is not checked until the next [`resolve`](Self::resolve).
    pub fn set_credentials_path(&mut self, path: impl AsRef<Path>) {
        self.path = normalize_credentials_path(path.as_ref());
        self.authorized = OnceCell::new();
        debug!(path = ?self.path, "Credentials path changed");
    }

    pub fn credentials_path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub fn is_authorized(&self) -> bool {
        self.authorized.initialized()
    }

    pub fn email(&self) -> Option<&str> {
        self.authorized.get().map(|a| a.email.as_str())
    }

    /// The embedded key wins over the key file.
    pub fn source(&self) -> std::result::Result<CredentialSource, SheetError> {
        if let Some(key) = &self.embedded {
            return Ok(CredentialSource::Embedded(Box::new(key.clone())));
        }
        if self.path.is_file() {
            return Ok(CredentialSource::File(self.path.clone()));
        }
        Err(SheetError::NoCredentialsFile(self.path.clone()))
    }

    /// Authorize on first use; later calls return the cached client.
    pub async fn resolve(&self) -> std::result::Result<&Authorized<A::Client>, SheetError> {
        self.authorized
            .get_or_try_init(|| async move {
                let key = load_key(self.source()?)?;
                let email = key.client_email.clone();

                let client = self
                    .authorizer
                    .authorize(key)
                    .await
                    .map_err(|e| SheetError::InvalidCredentials(e.to_string()))?;

                info!(%email, "Authorized service account");
                Ok(Authorized { client, email })
            })
            .await
    }
}

fn normalize_credentials_path(path: &Path) -> PathBuf {
    match path.is_dir() {
        true => path.join(CREDENTIALS_FILE_NAME),
        false => path.to_path_buf(),
    }
}

fn load_key(source: CredentialSource) -> std::result::Result<ServiceAccountKey, SheetError> {
    match source {
        CredentialSource::Embedded(key) => Ok(*key),
        CredentialSource::File(path) => {
            let contents = fs::read_to_string(&path).map_err(|e| {
                SheetError::InvalidCredentials(format!("Failed to read {:?}: {}", path, e))
            })?;
            serde_json::from_str(&contents).map_err(|e| {
                SheetError::InvalidCredentials(format!("Malformed key file {:?}: {}", path, e))
            })
        }
    }
}
