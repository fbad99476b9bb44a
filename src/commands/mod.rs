//! Command handlers for the ascbids CLI.
//!
//! Each submodule handles a specific CLI command or command group.
//! The main dispatch logic remains in main.rs.

pub mod batch;
pub mod completions;
pub mod config;
pub mod convert;
pub mod init;
pub mod inspect;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use ascbids::bids::BidsWriter;
use ascbids::cli::{OutputArgs, ParseArgs};
use ascbids::{Config, Converter, ParseOptions};

/// Trial options from the command line, falling back to the config.
pub fn parse_options(config: &Config, args: &ParseArgs) -> Result<ParseOptions> {
    Ok(config.parse_options(
        args.start_message.as_deref(),
        args.end_message.as_deref(),
        &args.saved_events,
    )?)
}

/// Converter for the given trial options.
pub fn converter(config: &Config, args: &ParseArgs) -> Result<Converter> {
    Ok(Converter::new(parse_options(config, args)?))
}

/// Output root from the command line, falling back to the config.
pub fn output_root(config: &Config, args: &OutputArgs) -> PathBuf {
    args.output
        .clone()
        .unwrap_or_else(|| config.output_directory())
}

/// Writer honouring both the config and the command line switches.
pub fn writer(config: &Config, args: &OutputArgs) -> BidsWriter {
    BidsWriter::new(output_root(config, args))
        .compress_samples(config.output.compress_samples && !args.no_compress)
        .copy_source(config.output.copy_source && !args.no_copy)
}

/// Read a settings JSON file holding an object of sidecar keys.
pub fn load_settings_json(path: &Path) -> Result<Map<String, Value>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read settings: {:?}", path))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse settings JSON: {:?}", path))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!("Settings JSON must be an object: {:?}", path),
    }
}

/// Settings JSON named on the command line, if any.
pub fn settings_overrides(args: &OutputArgs) -> Result<Option<Map<String, Value>>> {
    args.settings.as_deref().map(load_settings_json).transpose()
}
