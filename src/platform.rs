use crate::error::InstallError;
use crate::types::*;
use anyhow::{Context, Result};
use std::fmt;
use std::fs;
use std::path::Path;

pub fn get_system_info() -> PlatformInfo {
    let os = std::env::consts::OS.to_string();
    let arch = std::env::consts::ARCH.to_string();

    let normalized_arch = match arch.as_str() {
        "x86_64" => "amd64".to_string(),
        "aarch64" => "arm64".to_string(),
        _ => arch,
    };

    PlatformInfo {
        os,
        arch: normalized_arch,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Darwin,
    Linux,
}

impl Platform {
    pub fn detect(os: &str) -> Result<Self, InstallError> {
        match os {
            "macos" | "darwin" => Ok(Platform::Darwin),
            "linux" => Ok(Platform::Linux),
            other => Err(InstallError::UnsupportedPlatform(other.to_string())),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Darwin => f.write_str("darwin"),
            Platform::Linux => f.write_str("linux"),
        }
    }
}

/// Architecture label used in protoc release archive names.
pub fn archive_arch(arch: &str) -> Result<&'static str, InstallError> {
    match arch {
        "amd64" => Ok("x86_64"),
        "arm64" => Ok("aarch_64"),
        other => Err(InstallError::UnsupportedArchitecture(other.to_string())),
    }
}

/// The fields of `/etc/os-release` we care about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsRelease {
    pub id: String,
    pub version_id: String,
    pub id_like: String,
}

impl OsRelease {
    pub fn parse(content: &str) -> Self {
        let mut release = OsRelease::default();
        for line in content.lines() {
            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches('"').trim_matches('\'').to_string();
            match key {
                "ID" => release.id = value,
                "VERSION_ID" => release.version_id = value,
                "ID_LIKE" => release.id_like = value,
                _ => {}
            }
        }
        release
    }

    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        Ok(Self::parse(&content))
    }

    /// Lowercased distribution id with every SUSE flavour folded into `suse`.
    pub fn distribution_id(&self) -> Option<String> {
        if self.id.is_empty() {
            return None;
        }
        let id = self.id.to_lowercase();
        if id.contains("suse") || self.id_like.to_lowercase().contains("suse") {
            return Some("suse".to_string());
        }
        Some(id)
    }
}

/// Linux distribution families that differ in how protobuf is packaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distro {
    Debian,
    RedHat,
    Suse,
    Alpine,
}

/// How a distribution family probes for and removes its protobuf package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageCommands {
    pub probe: &'static [&'static str],
    pub remove: &'static [&'static str],
}

impl Distro {
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "ubuntu" | "debian" => Some(Distro::Debian),
            "centos" | "fedora" | "rhel" => Some(Distro::RedHat),
            "suse" => Some(Distro::Suse),
            "alpine" => Some(Distro::Alpine),
            _ => None,
        }
    }

    /// Picks the family from `ID`, falling back to each `ID_LIKE` entry so
    /// derivatives such as Linux Mint resolve to their parent.
    pub fn detect(release: &OsRelease, source: &Path) -> Result<(Self, String), InstallError> {
        let id = release
            .distribution_id()
            .ok_or_else(|| InstallError::UnknownDistribution {
                path: source.display().to_string(),
            })?;

        if let Some(distro) = Self::from_id(&id) {
            return Ok((distro, id));
        }
        let id_like = release.id_like.to_lowercase();
        match id_like.split_whitespace().find_map(Self::from_id) {
            Some(distro) => Ok((distro, id)),
            None => Err(InstallError::UnsupportedDistribution(id)),
        }
    }

    pub fn package_commands(self) -> PackageCommands {
        match self {
            Distro::Debian => PackageCommands {
                probe: &["dpkg", "-s", "protobuf-compiler"],
                remove: &["apt-get", "remove", "-y", "protobuf-compiler"],
            },
            Distro::RedHat => PackageCommands {
                probe: &["rpm", "-q", "protobuf-compiler"],
                remove: &["dnf", "remove", "-y", "protobuf-compiler"],
            },
            Distro::Suse => PackageCommands {
                probe: &["rpm", "-q", "protobuf"],
                remove: &["zypper", "--non-interactive", "remove", "protobuf"],
            },
            Distro::Alpine => PackageCommands {
                probe: &["apk", "info", "-e", "protobuf"],
                remove: &["apk", "del", "protobuf"],
            },
        }
    }
}
