use crate::command::CommandRunner;
use crate::error::InstallError;
use anyhow::Result;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+\.\d+").expect("static version pattern"))
}

/// A dotted numeric version token such as `24.4`.
///
/// Two versions are equal only if their text is identical; `24.4` and
/// `24.4.0` are different versions as far as reconciliation is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version(String);

impl Version {
    /// Accepts a version reported by a remote source, which must be
    /// non-empty and contain a numeric `major.minor` token.
    pub fn parse_stable(raw: &str) -> Result<Self, InstallError> {
        if raw.is_empty() || !version_pattern().is_match(raw) {
            return Err(InstallError::InvalidRemoteVersion(raw.to_string()));
        }
        Ok(Version(raw.to_string()))
    }

    /// Extracts the local version from `protoc --version` output.
    pub fn from_probe_output(output: &[u8]) -> Result<Self, InstallError> {
        let text = String::from_utf8_lossy(output);
        extract_version(&text)
            .map(|v| Version(v.to_string()))
            .ok_or_else(|| InstallError::UnparseableLocalVersion {
                output: text.trim().to_string(),
            })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First `\d+\.\d+` substring of `text`, if any.
pub fn extract_version(text: &str) -> Option<&str> {
    version_pattern().find(text).map(|m| m.as_str())
}

/// Runs `<program> --version`. An error means the compiler is missing or
/// not runnable.
pub fn probe(runner: &impl CommandRunner, program: &str) -> Result<Vec<u8>> {
    runner.output(program, &["--version"])
}
