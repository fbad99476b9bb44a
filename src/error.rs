//! Conversion errors.

use std::path::PathBuf;

/// Errors raised by the conversion core and its table lookups.
///
/// Malformed numeric tokens are never reported here: they degrade to null
/// values in the produced records.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(
        "No line contains the start message {marker:?}; the trials of this file cannot be located"
    )]
    MissingStartMessage { marker: String },

    #[error("The start message must not be empty")]
    EmptyStartMessage,

    #[error("The info table {table} has no entry for {filename}")]
    UnknownFile { filename: String, table: String },

    #[error("No trial {trial} in the event table")]
    UnknownTrial { trial: u32 },

    #[error("Invalid info table {path:?}: {reason}")]
    InvalidInfoTable { path: PathBuf, reason: String },

    #[error("Invalid {entity} label {value:?}: no alphanumeric characters left")]
    InvalidLabel { entity: &'static str, value: String },
}

impl Error {
    /// True for the variants that abort the parse of a whole file.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Error::MissingStartMessage { .. } | Error::EmptyStartMessage
        )
    }

    /// True for exact-key lookup failures.
    pub fn is_lookup_error(&self) -> bool {
        matches!(self, Error::UnknownFile { .. } | Error::UnknownTrial { .. })
    }
}
