//! Config subcommands handler

use anyhow::{bail, Result};
use std::path::Path;

use ascbids::Config;

/// Show the effective configuration as TOML.
#[cfg(not(tarpaulin_include))]
pub fn handle_show(config: &Config) -> Result<()> {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Write the default configuration, refusing to overwrite unless forced.
#[cfg(not(tarpaulin_include))]
pub fn handle_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Config file already exists: {}\nUse --force to overwrite it.",
            path.display()
        );
    }
    Config::default().save_to(path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

/// Print the configuration file path.
#[cfg(not(tarpaulin_include))]
pub fn handle_path(path: &Path) -> Result<()> {
    println!("{}", path.display());
    Ok(())
}
