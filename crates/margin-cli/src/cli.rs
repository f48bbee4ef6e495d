use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use margin_core::RenderKind;

/// Tag and proofread markdown notes with a remote annotation service
#[derive(Parser, Debug)]
#[command(name = "margin", version, propagate_version = true)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print machine-readable JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory holding settings.json
    #[arg(long, global = true, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Also write logs to a daily-rotated file in this directory
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate tags and insert them at the top of the note
    Tags {
        file: PathBuf,

        /// How the tags are rendered
        #[arg(long, default_value_t = RenderKind::Tag)]
        render: RenderKind,

        #[command(flatten)]
        overrides: ServiceOverrides,
    },
    /// Generate tags and merge them into the note's frontmatter
    Frontmatter {
        file: PathBuf,

        #[command(flatten)]
        overrides: ServiceOverrides,
    },
    /// Replace the note with a proofread version
    Proofread {
        file: PathBuf,

        #[command(flatten)]
        overrides: ServiceOverrides,
    },
    /// Show or change persisted settings
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
    /// List known model identifiers
    Models,
}

/// Per-run overrides; never persisted
#[derive(Args, Debug, Default, Clone)]
pub struct ServiceOverrides {
    /// Annotation service base URL
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Model identifier
    #[arg(long)]
    pub model: Option<String>,

    /// API key sent as a bearer token
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print current settings (API key masked)
    Show,
    /// Set one setting
    Set { key: ConfigKey, value: String },
    /// Restore the default service URL
    ResetUrl,
    /// Restore all defaults
    Reset,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigKey {
    ApiUrl,
    Model,
    ApiKey,
    /// Frontmatter property that receives tags
    Property,
}
