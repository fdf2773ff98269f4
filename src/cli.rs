use clap::{Parser, Subcommand, ValueEnum};

pub fn get_version() -> &'static str {
    const BASE_VERSION: &str = env!("CARGO_PKG_VERSION");

    // Tagged HEAD means a release build; the tag alone is the version
    if let Some(tag) = option_env!("PROTOC_SYNC_GIT_TAG") {
        return tag;
    }

    let commit = option_env!("PROTOC_SYNC_GIT_COMMIT").unwrap_or("unknown");
    let branch = option_env!("PROTOC_SYNC_GIT_BRANCH").unwrap_or("unknown");

    // Computed once per process for clap, which wants a &'static str
    let version = format!("v{}-{} ({})", BASE_VERSION, commit, branch);
    Box::leak(version.into_boxed_str())
}

#[derive(Parser)]
#[command(name = "protoc-sync")]
#[command(about = "Installs the protocol buffer compiler and keeps it up to date")]
#[command(version = get_version(), propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (use multiple times for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce output to errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Defaults to `sync` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install protoc, or upgrade it to the current stable release
    Sync,

    /// Remove protoc installed by the package manager or by protoc-sync
    Uninstall,

    /// Show the current version
    Version,

    /// Manage protoc-sync's configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a configuration setting
    Get {
        /// Key to get (if omitted, shows all settings)
        key: Option<String>,
    },
    /// Set a configuration setting
    Set {
        /// Key and value (e.g., 'prefix=/opt/protoc' or 'prefix /opt/protoc')
        #[arg(trailing_var_arg = true, required = true)]
        args: Vec<String>,
    },
    /// Restore a setting to its default
    Unset {
        /// Key to unset (e.g., 'elevate-with')
        key: String,
    },
    /// Show full configuration
    Show {
        #[arg(long, value_enum, default_value_t = ShowFormat::Json)]
        format: ShowFormat,
    },
    /// Print the location of the configuration file
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShowFormat {
    Json,
    Yaml,
}
