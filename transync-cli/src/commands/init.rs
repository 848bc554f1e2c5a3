//! `transync init [--force]`

use anyhow::{bail, Context, Result};
use clap::Args;

use transync_core::config::{self, Config};

/// Write a configuration template.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration file.
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let path = config::config_path().context("could not determine home directory")?;
        if path.exists() && !self.force {
            bail!(
                "'{}' already exists; pass --force to overwrite it",
                path.display()
            );
        }

        let written = config::save(&Config::template())
            .with_context(|| format!("failed to write '{}'", path.display()))?;

        println!("✓ Wrote configuration template to {}", written.display());
        println!(
            "  Fill in the registry section, or export {} for the password.",
            config::PASSWORD_ENV
        );
        Ok(())
    }
}
