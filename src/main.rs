mod cli;
mod command;
mod config;
mod download;
mod error;
mod install;
mod platform;
mod reconcile;
mod remote;
mod types;
mod version;


use anyhow::{anyhow, Result};
use clap::Parser;
use cli::{Cli, Commands, ConfigAction, ShowFormat};
use command::SystemRunner;
use config::{
    get_config_file_path, get_setting, load_settings, load_settings_file, save_settings,
    set_setting, unset_setting, SETTING_KEYS,
};
use reconcile::Reconciler;
use remote::ReqwestClient;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    setup_logging(&cli);

    if let Err(e) = run(cli).await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command.unwrap_or(Commands::Sync) {
        Commands::Sync => {
            let settings = load_settings()?;
            let host = platform::get_system_info();
            let runner = SystemRunner;
            let http = ReqwestClient::new();

            tracing::info!("Starting protoc installation check");
            let outcome = Reconciler::new(&runner, &http, &settings, &host)
                .reconcile()
                .await?;
            tracing::info!("Done: {}", outcome);
        }

        Commands::Uninstall => {
            let settings = load_settings()?;
            let host = platform::get_system_info();
            let runner = SystemRunner;
            let http = ReqwestClient::new();

            Reconciler::new(&runner, &http, &settings, &host).uninstall()?;
            tracing::info!("protoc removed");
        }

        Commands::Version => {
            println!("protoc-sync {}", cli::get_version());
        }

        Commands::Config { action } => run_config(action)?,
    }

    Ok(())
}

fn run_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let settings = load_settings_file()?;
            if let Some(key) = key {
                let value = get_setting(&settings, &key)
                    .ok_or_else(|| anyhow!("Setting '{}' not found", key))?;
                println!("{}", value);
            } else {
                println!("--- protoc-sync settings ---");
                for key in SETTING_KEYS {
                    let value = get_setting(&settings, key).unwrap_or_default();
                    println!("  {}: {}", key, value);
                }
            }
        }
        ConfigAction::Set { args } => {
            let (key, value) = match args.as_slice() {
                [pair] => pair
                    .split_once('=')
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .ok_or_else(|| anyhow!("Invalid format. Use 'key=value' or 'key value'."))?,
                [key, value] => (key.clone(), value.clone()),
                _ => return Err(anyhow!("Invalid format. Use 'key=value' or 'key value'.")),
            };
            let mut settings = load_settings_file()?;
            set_setting(&mut settings, &key, &value)?;
            save_settings(&settings)?;
            tracing::info!("Setting '{}' updated to '{}'", config::normalize_key(&key), value);
        }
        ConfigAction::Unset { key } => {
            let mut settings = load_settings_file()?;
            unset_setting(&mut settings, &key)?;
            save_settings(&settings)?;
            tracing::info!("Setting '{}' unset", config::normalize_key(&key));
        }
        ConfigAction::Show { format } => {
            let settings = load_settings_file()?;
            let rendered = match format {
                ShowFormat::Json => serde_json::to_string_pretty(&settings)?,
                ShowFormat::Yaml => serde_yaml::to_string(&settings)?,
            };
            println!("{}", rendered.trim_end());
        }
        ConfigAction::Path => {
            println!("{}", get_config_file_path()?.display());
        }
    }
    Ok(())
}

fn setup_logging(cli: &Cli) {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();
}
