//! Configuration management for ascbids

mod io;
mod types;

pub use types::*;

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::convert::ParseOptions;
use crate::error::Error;

/// Upper bound of the default batch worker count.
pub const MAX_DEFAULT_WORKERS: usize = 8;

impl Config {
    /// Get the config file path (~/.config/ascbids/config.toml)
    pub fn config_path() -> Result<PathBuf> {
        io::config_path()
    }

    /// Load configuration from an explicit path, or return defaults if not found
    pub fn load_from(path: &Path) -> Result<Self> {
        io::load_from(path)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        io::save_to(self, path)
    }

    /// Reject values no conversion can run with.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.conversion.start_message.trim().is_empty() {
            return Err("[conversion].start_message must not be empty".to_string());
        }
        if self.batch.workers == Some(0) {
            return Err("[batch].workers must be at least 1".to_string());
        }
        Ok(())
    }

    /// Expand ~ in the output directory path
    pub fn output_directory(&self) -> PathBuf {
        let dir = &self.output.directory;
        if let Some(stripped) = dir.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        }
        PathBuf::from(dir)
    }

    /// Parse options from the `[conversion]` section.
    ///
    /// `start` and `end` replace the configured markers when given. `extra`
    /// event names are appended to the configured ones, skipping duplicates.
    pub fn parse_options(
        &self,
        start: Option<&str>,
        end: Option<&str>,
        extra: &[String],
    ) -> std::result::Result<ParseOptions, Error> {
        let conversion = &self.conversion;
        let start = start.unwrap_or(&conversion.start_message);
        let end = end.map(str::to_string).or_else(|| conversion.end_message.clone());

        let mut saved = conversion.saved_events.clone();
        for name in extra {
            if !saved.contains(name) {
                saved.push(name.clone());
            }
        }

        Ok(ParseOptions::new(start)?
            .with_end_message(end)
            .with_saved_events(saved))
    }

    /// Batch worker count: the configured value, or the available
    /// parallelism capped at [`MAX_DEFAULT_WORKERS`].
    pub fn batch_workers(&self) -> usize {
        self.batch.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
                .min(MAX_DEFAULT_WORKERS)
        })
    }
}
