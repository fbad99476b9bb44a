//! ascbids Library
//!
//! A Rust library for converting EyeLink ASC recordings into BIDS
//! eye-tracking settings, sample streams and trial event tables.

pub mod asc;
pub mod batch;
pub mod bids;
pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod events;
pub mod logging;
pub mod samples;
pub mod settings;

pub use asc::{AscLog, LineKind};
pub use config::Config;
pub use convert::{Converter, ParseOptions, Recording};
pub use error::Error;
pub use events::{EventTable, EventValue, TrialEvent};
pub use samples::{SampleRecord, SampleSchema, SampleStream};
pub use settings::{CalibrationEntry, Settings};
