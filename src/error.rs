use thiserror::Error;

/// Failure kinds callers (and tests) may want to tell apart.
///
/// Everything else (network, JSON, filesystem) travels as a plain
/// `anyhow::Error` with context attached at the call site.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("failed to run command `{command}`: {reason}")]
    CommandFailed { command: String, reason: String },

    #[error("remote {url} unavailable (status: {status})")]
    RemoteUnavailable { url: String, status: u16 },

    #[error("remote reported an invalid stable version '{0}'")]
    InvalidRemoteVersion(String),

    #[error("failed to parse local protoc version from: {output}")]
    UnparseableLocalVersion { output: String },

    #[error("unsupported platform: {0}. Try to install protobuf manually")]
    UnsupportedPlatform(String),

    #[error("unsupported architecture: {0}")]
    UnsupportedArchitecture(String),

    #[error("could not determine Linux distribution from {path}")]
    UnknownDistribution { path: String },

    #[error("unsupported distribution: {0}. Try to install protobuf manually")]
    UnsupportedDistribution(String),
}

impl InstallError {
    pub fn command_failed(program: &str, args: &[&str], reason: impl ToString) -> Self {
        let command = if args.is_empty() {
            program.to_string()
        } else {
            format!("{} {}", program, args.join(" "))
        };
        InstallError::CommandFailed {
            command,
            reason: reason.to_string(),
        }
    }
}
