use crate::command::CommandRunner;
use anyhow::{Context, Result};

/// Installs protoc through Homebrew.
///
/// `brew install` is used for upgrades as well: it is a no-op when the
/// formula is current and upgrades it otherwise.
pub struct Homebrew<'a, R> {
    runner: &'a R,
    formula: &'a str,
}

impl<'a, R: CommandRunner> Homebrew<'a, R> {
    pub fn new(runner: &'a R, formula: &'a str) -> Self {
        Self { runner, formula }
    }

    pub fn install(&self) -> Result<()> {
        self.runner
            .run("brew", &["install", self.formula])
            .with_context(|| format!("failed to install {} on darwin", self.formula))
    }

    pub fn uninstall(&self) -> Result<()> {
        self.runner
            .run("brew", &["uninstall", self.formula])
            .with_context(|| format!("failed to uninstall {} on darwin", self.formula))
    }
}
