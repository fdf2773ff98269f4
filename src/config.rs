use crate::types::*;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::PathBuf;

pub const APP_NAME: &str = "protoc-sync";
pub const CONFIG_FILE_NAME: &str = "config.json";

pub const SETTING_KEYS: &[&str] = &[
    "prefix",
    "elevate_with",
    "protoc_bin",
    "brew_formula",
    "github_repo",
    "os_release_path",
];

pub fn get_config_file_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("PROTOC_SYNC_CONFIG") {
        return Ok(PathBuf::from(path));
    }
    let path = dirs::config_dir()
        .ok_or_else(|| anyhow!("Could not determine config directory"))?
        .join(APP_NAME)
        .join(CONFIG_FILE_NAME);
    tracing::debug!("Config file path: {}", path.display());
    Ok(path)
}

/// Settings as stored on disk, without environment overrides.
pub fn load_settings_file() -> Result<Settings> {
    let config_path = get_config_file_path()?;

    if !config_path.exists() {
        return Ok(Settings::default());
    }

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("Could not read config file at {}", config_path.display()))?;

    serde_json::from_str(&content).with_context(|| {
        format!(
            "Could not parse config file {} as JSON",
            config_path.display()
        )
    })
}

/// Settings used for a run: the file plus environment overrides.
pub fn load_settings() -> Result<Settings> {
    let mut settings = load_settings_file()?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(prefix) = std::env::var("PROTOC_SYNC_PREFIX") {
        settings.prefix = prefix;
    }
    if let Ok(elevate) = std::env::var("PROTOC_SYNC_ELEVATE") {
        settings.elevate_with = elevate;
    }
    if let Ok(protoc) = std::env::var("PROTOC_SYNC_PROTOC") {
        settings.protoc_bin = protoc;
    }
    if let Ok(path) = std::env::var("PROTOC_SYNC_OS_RELEASE") {
        settings.os_release_path = path;
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let config_path = get_config_file_path()?;
    let config_dir = config_path
        .parent()
        .ok_or_else(|| anyhow!("Invalid config path"))?;

    fs::create_dir_all(config_dir)
        .with_context(|| format!("Could not create {}", config_dir.display()))?;

    let content = serde_json::to_string_pretty(settings)?;
    fs::write(&config_path, content)
        .with_context(|| format!("Could not write config file {}", config_path.display()))?;

    Ok(())
}

pub fn normalize_key(key: &str) -> String {
    key.replace('-', "_")
        .chars()
        .map(|c| {
            if c.is_ascii_uppercase() {
                format!("_{}", c.to_lowercase())
            } else {
                c.to_string()
            }
        })
        .collect::<String>()
        .to_lowercase()
}

pub fn get_setting(settings: &Settings, key: &str) -> Option<String> {
    let value = match normalize_key(key).as_str() {
        "prefix" => &settings.prefix,
        "elevate_with" => &settings.elevate_with,
        "protoc_bin" => &settings.protoc_bin,
        "brew_formula" => &settings.brew_formula,
        "github_repo" => &settings.github_repo,
        "os_release_path" => &settings.os_release_path,
        _ => return None,
    };
    Some(value.clone())
}

pub fn set_setting(settings: &mut Settings, key: &str, value: &str) -> Result<()> {
    let key = normalize_key(key);
    // An empty elevation wrapper is meaningful (run privileged steps directly)
    if value.is_empty() && key != "elevate_with" {
        return Err(anyhow!("Value for '{}' cannot be empty", key));
    }
    let slot = match key.as_str() {
        "prefix" => &mut settings.prefix,
        "elevate_with" => &mut settings.elevate_with,
        "protoc_bin" => &mut settings.protoc_bin,
        "brew_formula" => &mut settings.brew_formula,
        "github_repo" => {
            if value.split('/').filter(|p| !p.is_empty()).count() != 2 {
                return Err(anyhow!(
                    "Invalid value for 'github_repo': expected 'owner/repo', got '{}'",
                    value
                ));
            }
            &mut settings.github_repo
        }
        "os_release_path" => &mut settings.os_release_path,
        _ => return Err(unknown_key(&key)),
    };
    *slot = value.to_string();
    Ok(())
}

pub fn unset_setting(settings: &mut Settings, key: &str) -> Result<()> {
    let key = normalize_key(key);
    let defaults = Settings::default();
    match key.as_str() {
        "prefix" => settings.prefix = defaults.prefix,
        "elevate_with" => settings.elevate_with = defaults.elevate_with,
        "protoc_bin" => settings.protoc_bin = defaults.protoc_bin,
        "brew_formula" => settings.brew_formula = defaults.brew_formula,
        "github_repo" => settings.github_repo = defaults.github_repo,
        "os_release_path" => settings.os_release_path = defaults.os_release_path,
        _ => return Err(unknown_key(&key)),
    }
    Ok(())
}

fn unknown_key(key: &str) -> anyhow::Error {
    anyhow!(
        "'{}' is not a valid configuration setting. Valid settings: {}",
        key,
        SETTING_KEYS.join(", ")
    )
}
