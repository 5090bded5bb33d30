//! Wrapper around the external tool that unpacks and repacks game assets.

use crate::config::PackagingConfig;
use crate::error::{AppError, Result};
use std::ffi::OsString;
use std::process::ExitStatus;
use tokio::process::Command;
use tracing::{info, instrument, warn};

fn import_args(config: &PackagingConfig) -> Vec<OsString> {
    vec![
        "import".into(),
        "--game-path".into(),
        config.game_path.clone().into(),
        "--source-directory".into(),
        config.source_dir.clone().into(),
        "--object-directory".into(),
        config.object_dir.clone().into(),
    ]
}

fn export_args(config: &PackagingConfig) -> Vec<OsString> {
    vec![
        "export".into(),
        "--game-path".into(),
        config.game_path.clone().into(),
        "--export-directory".into(),
        config.source_dir.clone().into(),
    ]
}

/// Repack the patched files into the game.
#[instrument(name = "Repacking game", skip_all)]
pub async fn import_game(config: &PackagingConfig) -> Result<ExitStatus> {
    run_tool(config, import_args(config)).await
}

/// Extract the game assets into the source directory.
#[instrument(name = "Exporting game assets", skip_all)]
pub async fn export_game(config: &PackagingConfig) -> Result<ExitStatus> {
    run_tool(config, export_args(config)).await
}

/// Run the tool and report its exit status. A non-zero status is logged, not
/// treated as an error; only failing to launch the tool is.
async fn run_tool(config: &PackagingConfig, args: Vec<OsString>) -> Result<ExitStatus> {
    let status = Command::new(&config.tool_path)
        .args(&args)
        .status()
        .await
        .map_err(|e| {
            AppError::Packaging(format!(
                "Failed to launch {:?}: {}",
                config.tool_path, e
            ))
        })?;

    match status.success() {
        true => info!(%status, "Packaging tool finished"),
        false => warn!(%status, "Packaging tool reported failure"),
    }

    Ok(status)
}
