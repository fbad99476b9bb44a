//! Configuration type definitions and defaults

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub conversion: ConversionConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Trial markers and watched events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Text that opens a trial
    #[serde(default = "default_start_message")]
    pub start_message: String,
    /// Text that closes a trial (next start message when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_message: Option<String>,
    /// Message names captured per trial
    #[serde(default)]
    pub saved_events: Vec<String>,
}

pub fn default_start_message() -> String {
    "TRIALID".to_string()
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            start_message: default_start_message(),
            end_message: None,
            saved_events: Vec::new(),
        }
    }
}

/// Output layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root of the BIDS tree
    #[serde(default = "default_directory")]
    pub directory: String,
    /// Gzip the sample table
    #[serde(default = "default_true")]
    pub compress_samples: bool,
    /// Copy the source log into the BIDS tree
    #[serde(default = "default_true")]
    pub copy_source: bool,
}

pub fn default_directory() -> String {
    "bids".to_string()
}

pub fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            compress_samples: default_true(),
            copy_source: default_true(),
        }
    }
}

/// Batch conversion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Worker threads (available parallelism, at most 8, when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    /// Info table name inside the input directory (discovered when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_file: Option<String>,
}

