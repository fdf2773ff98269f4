//! Remote sources of truth for the current stable protoc release.

use crate::download::download_file;
use crate::error::InstallError;
use crate::platform::Platform;
use crate::types::{BrewFormula, GitHubRelease, Settings};
use crate::version::Version;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

const USER_AGENT: &str = concat!("protoc-sync/", env!("CARGO_PKG_VERSION"));

/// The two HTTP operations the installer needs.
#[allow(async_fn_in_trait)]
pub trait HttpClient {
    /// GETs `url` and decodes the JSON body. Non-2xx responses are
    /// [`InstallError::RemoteUnavailable`].
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T>;

    /// Streams `url` into `dest`.
    async fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HttpClient for ReqwestClient {
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!("Fetching {}", url);

        let mut request = self.client.get(url).header("User-Agent", USER_AGENT);
        if url.starts_with("https://api.github.com/") {
            request = request.header("Accept", "application/vnd.github.v3+json");
            if let Ok(token) = std::env::var("GITHUB_TOKEN") {
                request = request.header("Authorization", format!("token {}", token));
                tracing::debug!("Using GITHUB_TOKEN");
            }
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(InstallError::RemoteUnavailable {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("failed to decode JSON from {}", url))
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        download_file(&self.client, USER_AGENT, url, dest).await
    }
}

pub fn brew_formula_url(formula: &str) -> String {
    format!("https://formulae.brew.sh/api/formula/{}.json", formula)
}

pub fn latest_release_url(repo: &str) -> String {
    format!("https://api.github.com/repos/{}/releases/latest", repo)
}

/// Download URL of the prebuilt Linux protoc archive for `version`.
pub fn release_archive_url(repo: &str, version: &Version, archive_arch: &str) -> String {
    format!(
        "https://github.com/{repo}/releases/download/v{v}/protoc-{v}-linux-{arch}.zip",
        repo = repo,
        v = version,
        arch = archive_arch
    )
}

/// Stable protoc version for `platform`: Homebrew's formula on macOS, the
/// latest GitHub release everywhere else we support.
pub async fn stable_version(
    http: &impl HttpClient,
    platform: Platform,
    settings: &Settings,
) -> Result<Version> {
    let raw = match platform {
        Platform::Darwin => {
            let formula: BrewFormula = http
                .get_json(&brew_formula_url(&settings.brew_formula))
                .await
                .context("failed to get stable protoc version from Homebrew")?;
            formula.versions.stable
        }
        Platform::Linux => {
            let release: GitHubRelease = http
                .get_json(&latest_release_url(&settings.github_repo))
                .await
                .context("failed to check GitHub protobuf version")?;
            strip_tag_prefix(&release.tag_name).to_string()
        }
    };
    Ok(Version::parse_stable(&raw)?)
}

fn strip_tag_prefix(tag: &str) -> &str {
    let tag = tag.trim();
    tag.strip_prefix('v').unwrap_or(tag)
}
