mod cli;
mod config;
mod error;
mod models;
mod packaging;
mod sheets;
mod sync;

use clap::Parser;

use crate::cli::Cli;
use crate::error::AppError;
use tracing::error;
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() {
    // Initialize logging, routed through the progress bars
    let indicatif_layer = IndicatifLayer::new();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(indicatif_layer.get_stderr_writer()))
        .with(indicatif_layer)
        .init();

    let cli = Cli::parse();

    if let Err(e) = cli.run().await {
        match &e {
            AppError::Sheets(sheet_error) => {
                error!(hint = sheet_error.remediation(), "Error: {}", e)
            }
            _ => error!("Error: {}", e),
        }
        std::process::exit(1);
    }
}
