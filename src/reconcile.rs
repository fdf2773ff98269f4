//! Brings the local protoc in line with the current stable release.
//!
//! ```text
//! Start -> DetectPlatform -> Darwin | Linux | Unsupported -> Done
//! ```
//!
//! Both flows probe `protoc --version`, install when the probe fails, and
//! reinstall when the extracted version differs from the remote stable
//! version by exact text comparison. Any failure aborts the run.

use crate::command::CommandRunner;
use crate::install::{remove_packaged, ArchiveInstaller, Homebrew};
use crate::platform::{Distro, OsRelease, Platform};
use crate::remote::{stable_version, HttpClient};
use crate::types::{PlatformInfo, Settings};
use crate::version::{probe, Version};
use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Local protoc already matched the stable version.
    Current(Version),
    /// protoc was missing and has been installed.
    Installed(Version),
    Upgraded { from: Version, to: Version },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Current(v) => write!(f, "protoc {} is up to date", v),
            Outcome::Installed(v) => write!(f, "installed protoc {}", v),
            Outcome::Upgraded { from, to } => write!(f, "upgraded protoc {} -> {}", from, to),
        }
    }
}

pub struct Reconciler<'a, R, H> {
    runner: &'a R,
    http: &'a H,
    settings: &'a Settings,
    host: &'a PlatformInfo,
}

impl<'a, R: CommandRunner, H: HttpClient> Reconciler<'a, R, H> {
    pub fn new(runner: &'a R, http: &'a H, settings: &'a Settings, host: &'a PlatformInfo) -> Self {
        Self {
            runner,
            http,
            settings,
            host,
        }
    }

    pub async fn reconcile(&self) -> Result<Outcome> {
        tracing::info!("Detected platform: {} ({})", self.host.os, self.host.arch);

        match Platform::detect(&self.host.os)? {
            Platform::Darwin => self.reconcile_darwin().await,
            Platform::Linux => self.reconcile_linux().await,
        }
    }

    async fn reconcile_darwin(&self) -> Result<Outcome> {
        let brew = Homebrew::new(self.runner, &self.settings.brew_formula);
        let protoc = self.settings.protoc_bin.as_str();

        let (output, fresh) = match probe(self.runner, protoc) {
            Ok(output) => (output, false),
            Err(e) => {
                tracing::info!("Protoc not found ({:#}), installing via brew", e);
                brew.install()?;
                let output = probe(self.runner, protoc)
                    .context("failed to get protoc version after installation")?;
                (output, true)
            }
        };

        let local = Version::from_probe_output(&output)?;
        tracing::info!("Local protoc version: {}", local);

        let stable = stable_version(self.http, Platform::Darwin, self.settings)
            .await
            .context("failed to get stable protoc version")?;
        tracing::info!("Stable protoc version: {}", stable);

        if local == stable {
            return Ok(settled(local, fresh));
        }

        tracing::info!("Version mismatch detected, updating {}", self.settings.brew_formula);
        brew.install()?;
        let output = probe(self.runner, protoc)
            .context("failed to get protoc version after update")?;
        let updated = Version::from_probe_output(&output)?;
        if updated != stable {
            tracing::warn!(
                "Homebrew installed protoc {} but the formula reports {}",
                updated,
                stable
            );
        }

        Ok(if fresh {
            Outcome::Installed(updated)
        } else {
            Outcome::Upgraded {
                from: local,
                to: updated,
            }
        })
    }

    async fn reconcile_linux(&self) -> Result<Outcome> {
        let distro = self.detect_distro()?;

        tracing::info!("Removing existing protobuf from package manager");
        if remove_packaged(self.runner, distro, &self.settings.elevate_with)
            .context("failed to remove package manager protobuf")?
        {
            tracing::info!("Removed packaged protobuf compiler");
        }

        let stable = stable_version(self.http, Platform::Linux, self.settings)
            .await
            .context("failed to get stable protoc version")?;
        tracing::info!("Stable protoc version: {}", stable);

        let installer =
            ArchiveInstaller::new(self.runner, self.http, self.settings, &self.host.arch);

        // Prefer the copy we manage; fall back to whatever is on PATH
        let managed = installer.binary_path();
        let target = if managed.exists() {
            managed.to_string_lossy().to_string()
        } else {
            self.settings.protoc_bin.clone()
        };

        let (output, fresh) = match probe(self.runner, &target) {
            Ok(output) => (output, false),
            Err(e) => {
                tracing::info!("Protoc not found ({:#}), attempting installation", e);
                let binary = installer
                    .install(&stable)
                    .await
                    .context("failed to install protobuf on linux")?;
                let output = probe(self.runner, &binary.to_string_lossy())
                    .context("failed to get protoc version after installation")?;
                (output, true)
            }
        };

        let local = Version::from_probe_output(&output)?;
        tracing::info!("Local protoc version: {}", local);

        if local == stable {
            return Ok(settled(local, fresh));
        }

        tracing::info!("Version mismatch detected ({} != {}), updating protobuf", local, stable);
        let binary = installer
            .install(&stable)
            .await
            .context("failed to update protobuf on linux")?;
        let output = probe(self.runner, &binary.to_string_lossy())
            .context("failed to get protoc version after update")?;
        let updated = Version::from_probe_output(&output)?;
        if updated != stable {
            tracing::warn!("Release {} installed a protoc that reports {}", stable, updated);
        }

        Ok(if fresh {
            Outcome::Installed(updated)
        } else {
            Outcome::Upgraded {
                from: local,
                to: updated,
            }
        })
    }

    fn detect_distro(&self) -> Result<Distro> {
        let source = Path::new(&self.settings.os_release_path);
        tracing::info!("Detecting Linux distribution from {}", source.display());

        let release = OsRelease::read(source).context("failed to detect linux distribution")?;
        let (distro, id) =
            Distro::detect(&release, source).context("failed to detect linux distribution")?;
        tracing::info!("Detected Linux distribution: {} {}", id, release.version_id);
        Ok(distro)
    }

    /// Removes protoc installed by the package manager and, on Linux, the
    /// release files under the prefix.
    pub fn uninstall(&self) -> Result<()> {
        match Platform::detect(&self.host.os)? {
            Platform::Darwin => Homebrew::new(self.runner, &self.settings.brew_formula).uninstall(),
            Platform::Linux => {
                let distro = self.detect_distro()?;
                let packaged = remove_packaged(self.runner, distro, &self.settings.elevate_with)
                    .context("failed to remove package manager protobuf")?;
                let installer =
                    ArchiveInstaller::new(self.runner, self.http, self.settings, &self.host.arch);
                let released = installer.uninstall()?;
                if !packaged && !released {
                    tracing::info!("protoc was not installed");
                }
                Ok(())
            }
        }
    }
}

fn settled(local: Version, fresh: bool) -> Outcome {
    if fresh {
        Outcome::Installed(local)
    } else {
        Outcome::Current(local)
    }
}
