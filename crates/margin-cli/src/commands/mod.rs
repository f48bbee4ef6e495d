//! Subcommand handlers

pub mod annotate;
pub mod config;
pub mod models;

use std::path::PathBuf;

use margin_core::{Operation, SettingsManager};

use crate::cli::{Cli, Command};

/// Options shared by every subcommand
pub struct Context {
    pub config_dir: PathBuf,
    pub json: bool,
}

impl Context {
    pub fn settings_manager(&self) -> SettingsManager {
        SettingsManager::new(self.config_dir.clone())
    }
}

/// Runs the parsed command. `Ok(false)` means the command ran but failed.
pub async fn dispatch(cli: Cli) -> anyhow::Result<bool> {
    let ctx = Context {
        config_dir: cli
            .config_dir
            .unwrap_or_else(SettingsManager::default_dir),
        json: cli.json,
    };

    match cli.command {
        Command::Tags {
            file,
            render,
            overrides,
        } => annotate::run(&ctx, &file, Operation::TagAtTop { render }, &overrides).await,
        Command::Frontmatter { file, overrides } => {
            annotate::run(&ctx, &file, Operation::TagInMetadata, &overrides).await
        }
        Command::Proofread { file, overrides } => {
            annotate::run(&ctx, &file, Operation::Proofread, &overrides).await
        }
        Command::Config { action } => config::run(&ctx, action).map(|_| true),
        Command::Models => models::run(&ctx).map(|_| true),
    }
}
