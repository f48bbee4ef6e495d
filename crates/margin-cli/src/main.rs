//! Margin CLI
//!
//! Tags and proofreads markdown notes through a remote annotation service.
//!
//! # Commands
//!
//! - `tags <FILE>`: insert generated tags at the top of the note
//! - `frontmatter <FILE>`: merge generated tags into the frontmatter
//! - `proofread <FILE>`: replace the note with corrected text
//! - `config`: show, set or reset persisted settings
//! - `models`: list known model identifiers
//!
//! Exit code 1 means the operation ran and failed; 2 means it could not start.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;

mod cli;
mod commands;
mod logging;
mod terminal;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    let _log_guard = logging::init(cli.verbose, cli.log_dir.as_deref());

    match commands::dispatch(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            error!("{:#}", err);
            ExitCode::from(2)
        }
    }
}
