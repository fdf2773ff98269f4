//! Child process execution.
//!
//! Everything the installer shells out to goes through [`CommandRunner`] so
//! the reconciliation flow can be driven by a scripted runner in tests.

use crate::error::InstallError;
use anyhow::Result;
use std::process::{Command, Stdio};

pub trait CommandRunner {
    /// Runs `program` with stdout/stderr inherited from this process.
    fn run(&self, program: &str, args: &[&str]) -> Result<()>;

    /// Runs `program` and returns its captured stdout. Stderr is still
    /// forwarded to this process's stderr.
    fn output(&self, program: &str, args: &[&str]) -> Result<Vec<u8>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<()> {
        tracing::info!("Running command: {} {}", program, args.join(" "));

        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| InstallError::command_failed(program, args, e))?;

        if !status.success() {
            return Err(InstallError::command_failed(program, args, status).into());
        }
        Ok(())
    }

    fn output(&self, program: &str, args: &[&str]) -> Result<Vec<u8>> {
        tracing::info!("Running command: {} {}", program, args.join(" "));

        let output = Command::new(program)
            .args(args)
            .stderr(Stdio::inherit())
            .output()
            .map_err(|e| InstallError::command_failed(program, args, e))?;

        if !output.status.success() {
            return Err(InstallError::command_failed(program, args, output.status).into());
        }
        Ok(output.stdout)
    }
}

/// Runs `program` through the elevation wrapper when one is configured.
pub fn run_elevated(
    runner: &impl CommandRunner,
    elevate_with: &str,
    program: &str,
    args: &[&str],
) -> Result<()> {
    if elevate_with.is_empty() {
        return runner.run(program, args);
    }
    let mut full_args = Vec::with_capacity(args.len() + 1);
    full_args.push(program);
    full_args.extend_from_slice(args);
    runner.run(elevate_with, &full_args)
}
