use crate::config::Config;
use crate::error::Result;
use clap::Subcommand;
use tracing::info;

#[derive(Subcommand, Debug)]
pub enum ShowResource {
    /// Show configuration, cache and credentials paths
    Paths,
    /// List the documents configured for sync
    Documents,
}

impl ShowResource {
    pub async fn execute(&self, config: Result<Config>) -> Result<()> {
        match self {
            ShowResource::Paths => show_paths(config.ok()),
            ShowResource::Documents => show_documents(&config?),
        }
    }
}

fn show_paths(config: Option<Config>) -> Result<()> {
    let config_path = Config::config_file()?;
    let cache_dir = Config::cache_dir()?;

    info!(path = ?config_path, "Config path");
    info!(path = ?cache_dir, "Cache path");

    if let Some(config) = config {
        match config.google.service_account {
            Some(key) => info!(email = %key.client_email, "Credentials embedded in config"),
            None => info!(path = ?config.google.credentials_path(), "Credentials path"),
        }
        info!(path = ?config.sync.record_dir, "Record directory");
    }

    Ok(())
}

fn show_documents(config: &Config) -> Result<()> {
    for doc in &config.sync.documents {
        let record = config.sync.record_dir.join(&doc.name);
        match &doc.id {
            Some(id) => info!(name = %doc.name, id = %id, sheet = doc.sheet, record = ?record, "Document"),
            None => info!(name = %doc.name, sheet = doc.sheet, record = ?record, "Document (looked up by name)"),
        }
    }

    Ok(())
}
