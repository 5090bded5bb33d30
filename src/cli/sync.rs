use super::Context;
use crate::error::{AppError, Result};
use crate::packaging;
use crate::sync::{SpanProgress, SyncEngine};
use tracing::info;

pub(super) async fn execute(context: Context, only: &[String], no_package: bool) -> Result<()> {
    let Context { config, session } = context;

    let packaging = match (no_package, config.packaging) {
        (true, _) => None,
        (false, Some(packaging)) => Some(packaging),
        (false, None) => {
            return Err(AppError::Config(
                "[packaging] section missing; add it or pass --no-package".to_string(),
            ));
        }
    };

    let engine = SyncEngine::new(config.sync, session);
    let report = engine.sync(only, &SpanProgress).await?;

    info!(
        documents = report.documents,
        updated = report.updated_records,
        "Sync completed"
    );

    if let Some(packaging) = packaging {
        packaging::import_game(&packaging).await?;
    }

    Ok(())
}
