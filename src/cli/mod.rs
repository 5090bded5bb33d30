mod auth;
mod export;
mod read;
mod show;
mod sync;

use crate::config::Config;
use crate::error::Result;
use crate::sheets::{CancelHandle, CredentialResolver, GoogleAuthorizer, SheetSession};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::warn;

pub use read::ReadArgs;
pub use show::ShowResource;

#[derive(Parser, Debug)]
#[command(name = "locsync")]
#[command(about = "Sync translations from Google Sheets into game script files", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file to use instead of the XDG config path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Service account key file, or a directory containing credentials.json
    #[arg(long, global = true)]
    pub credentials: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Sync { only, no_package } => {
                sync::execute(self.context()?, only, *no_package).await
            }
            Commands::Auth { reset } => auth::execute(self.context()?, *reset).await,
            Commands::Read(args) => read::execute(self.context()?, args).await,
            Commands::Export => export::execute(&self.load_config()?).await,
            Commands::Show { resource } => resource.execute(self.load_config()).await,
        }
    }

    fn load_config(&self) -> Result<Config> {
        match &self.config {
            Some(path) => Config::load_from(path),
            None => Config::load(),
        }
    }

    fn context(&self) -> Result<Context> {
        let config = self.load_config()?;
        let session = build_session(&config, self.credentials.as_deref());
        Ok(Context { config, session })
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch every configured document, patch the record files and repack the game
    Sync {
        /// Only sync the named documents
        #[arg(long)]
        only: Vec<String>,

        /// Skip running the packaging tool
        #[arg(long)]
        no_package: bool,
    },
    /// Verify the service account credentials
    Auth {
        /// Clear cached tokens first
        #[arg(long)]
        reset: bool,
    },
    /// Print a sheet, a cell range or a single cell as JSON
    Read(ReadArgs),
    /// Extract the game assets with the packaging tool
    Export,
    Show {
        #[command(subcommand)]
        resource: ShowResource,
    },
}

pub(crate) struct Context {
    pub config: Config,
    pub session: SheetSession<GoogleAuthorizer>,
}

fn build_session(config: &Config, credentials: Option<&Path>) -> SheetSession<GoogleAuthorizer> {
    let mut resolver = CredentialResolver::new(GoogleAuthorizer, &config.google);
    if let Some(path) = credentials {
        resolver.set_credentials_path(path);
    }

    // First Ctrl-C aborts pending retry waits, a second one exits
    let cancel = CancelHandle::default();
    tokio::spawn(handle_interrupts(cancel.clone()));

    SheetSession::new(resolver, config.retry.policy().with_cancel(cancel))
}

/// Exit status of a process killed by SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Debug, PartialEq, Eq)]
enum Interrupt {
    Cancel,
    Exit,
}

fn on_interrupt(cancel: &CancelHandle) -> Interrupt {
    match cancel.is_cancelled() {
        true => Interrupt::Exit,
        false => {
            cancel.cancel();
            Interrupt::Cancel
        }
    }
}

async fn handle_interrupts(cancel: CancelHandle) {
    while tokio::signal::ctrl_c().await.is_ok() {
        match on_interrupt(&cancel) {
            Interrupt::Cancel => {
                warn!("Interrupted, aborting pending retries. Press Ctrl-C again to exit")
            }
            Interrupt::Exit => {
                warn!("Interrupted again, exiting");
                std::process::exit(INTERRUPTED_EXIT_CODE);
            }
        }
    }
}
