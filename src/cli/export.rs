use crate::config::Config;
use crate::error::{AppError, Result};
use crate::packaging;

pub(super) async fn execute(config: &Config) -> Result<()> {
    let packaging = config.packaging.as_ref().ok_or_else(|| {
        AppError::Config("[packaging] section must be set in config file".to_string())
    })?;

    packaging::export_game(packaging).await?;

    Ok(())
}
