use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_elevate_with")]
    pub elevate_with: String,
    #[serde(default = "default_protoc_bin")]
    pub protoc_bin: String,
    #[serde(default = "default_brew_formula")]
    pub brew_formula: String,
    #[serde(default = "default_github_repo")]
    pub github_repo: String,
    #[serde(default = "default_os_release_path")]
    pub os_release_path: String,
}

fn default_prefix() -> String {
    "/usr/local".to_string()
}
fn default_elevate_with() -> String {
    "sudo".to_string()
}
fn default_protoc_bin() -> String {
    "protoc".to_string()
}
fn default_brew_formula() -> String {
    "protobuf".to_string()
}
fn default_github_repo() -> String {
    "protocolbuffers/protobuf".to_string()
}
fn default_os_release_path() -> String {
    "/etc/os-release".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            elevate_with: default_elevate_with(),
            protoc_bin: default_protoc_bin(),
            brew_formula: default_brew_formula(),
            github_repo: default_github_repo(),
            os_release_path: default_os_release_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatformInfo {
    pub os: String,
    pub arch: String,
}

/// `GET https://formulae.brew.sh/api/formula/<name>.json`, trimmed to what we read.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BrewFormula {
    pub versions: BrewVersions,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BrewVersions {
    pub stable: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GitHubRelease {
    pub tag_name: String,
}
