use super::Context;
use crate::error::Result;
use crate::sheets::{CredentialSource, clear_sheets_tokens};
use tracing::info;

pub(super) async fn execute(context: Context, reset: bool) -> Result<()> {
    if reset {
        clear_sheets_tokens()?;
    }

    let resolver = context.session.resolver();
    match resolver.source()? {
        CredentialSource::Embedded(_) => info!("Using service account embedded in config"),
        CredentialSource::File(_) => {
            info!(path = ?resolver.credentials_path(), "Using service account key file")
        }
    }

    resolver.resolve().await?;
    if let Some(email) = resolver.email() {
        info!(%email, "Google Sheets authentication verified");
    }

    Ok(())
}
