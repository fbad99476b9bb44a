//! Conversion of one ASC log into a [`Recording`].

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::asc::AscLog;
use crate::error::Error;
use crate::events::{EventTable, TrialEventExtractor};
use crate::samples::{SampleStream, SampleStreamExtractor};
use crate::settings::{Settings, SettingsExtractor};

/// Trial markers and watched events of a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    start_message: String,
    end_message: Option<String>,
    saved_events: Vec<String>,
}

impl ParseOptions {
    /// Options with only a start message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyStartMessage`] for an empty or blank marker,
    /// which would match every line.
    pub fn new(start_message: impl Into<String>) -> Result<Self, Error> {
        let start_message = start_message.into();
        if start_message.trim().is_empty() {
            return Err(Error::EmptyStartMessage);
        }
        Ok(Self {
            start_message,
            end_message: None,
            saved_events: Vec::new(),
        })
    }

    /// Close trials on this marker instead of the next start message.
    /// A blank marker means none.
    pub fn with_end_message(mut self, end_message: Option<String>) -> Self {
        self.end_message = end_message.filter(|m| !m.trim().is_empty());
        self
    }

    /// Event names to capture per trial.
    pub fn with_saved_events(mut self, saved_events: Vec<String>) -> Self {
        self.saved_events = saved_events;
        self
    }

    pub fn start_message(&self) -> &str {
        &self.start_message
    }

    pub fn end_message(&self) -> Option<&str> {
        self.end_message.as_deref()
    }

    pub fn saved_events(&self) -> &[String] {
        &self.saved_events
    }
}

/// Everything extracted from one log.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub settings: Settings,
    pub samples: SampleStream,
    pub events: EventTable,
}

impl Recording {
    /// Warn about every required setting that is still missing and return
    /// them. Missing settings never fail a conversion.
    pub fn check_required(&self) -> Vec<&'static str> {
        let missing = self.settings.missing_required();
        if !missing.is_empty() {
            warn!(missing = ?missing, "required settings are not filled");
        }
        missing
    }
}

/// Runs the settings, samples and events passes over a log.
#[derive(Debug, Clone)]
pub struct Converter {
    options: ParseOptions,
}

impl Converter {
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Convert a log held in memory.
    ///
    /// Settings are extracted first since their eye-movement tokens extend
    /// the event watch-list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingStartMessage`] if the start message never
    /// occurs. Nothing is returned in that case.
    pub fn convert(&self, log: &AscLog) -> Result<Recording, Error> {
        self.convert_with(log, Settings::new())
    }

    /// Convert a log on top of settings supplied up front.
    pub fn convert_with(&self, log: &AscLog, base: Settings) -> Result<Recording, Error> {
        let options = &self.options;
        let settings = SettingsExtractor::new(options.start_message(), options.end_message())
            .extract_into(log, base)?;
        let samples = SampleStreamExtractor::new().extract(log);
        let events = TrialEventExtractor::new(
            options.start_message(),
            options.end_message(),
            options.saved_events(),
            Some(&settings),
        )
        .extract(log);

        debug!(
            lines = log.len(),
            samples = samples.len(),
            trials = events.len(),
            "converted log"
        );
        Ok(Recording {
            settings,
            samples,
            events,
        })
    }

    /// Load and convert a log file.
    pub fn convert_path(&self, path: &Path) -> Result<Recording> {
        let log = AscLog::parse(path)?;
        self.convert(&log)
            .with_context(|| format!("Failed to convert {:?}", path))
    }
}
