use crate::command::{run_elevated, CommandRunner};
use crate::platform::Distro;
use anyhow::{Context, Result};

/// Removes the distribution's own protobuf compiler package, if installed,
/// so it cannot shadow the release build. Returns whether anything was
/// removed.
pub fn remove_packaged(
    runner: &impl CommandRunner,
    distro: Distro,
    elevate_with: &str,
) -> Result<bool> {
    let commands = distro.package_commands();
    let (probe, probe_args) = split(commands.probe);

    if runner.output(probe, probe_args).is_err() {
        tracing::debug!("No packaged protobuf compiler found ({:?})", distro);
        return Ok(false);
    }

    let (program, args) = split(commands.remove);
    run_elevated(runner, elevate_with, program, args)
        .with_context(|| format!("failed to remove packaged protobuf compiler via {}", program))?;
    Ok(true)
}

fn split<'a>(command: &'a [&'a str]) -> (&'a str, &'a [&'a str]) {
    match command.split_first() {
        Some((program, args)) => (*program, args),
        None => ("", &[]),
    }
}
