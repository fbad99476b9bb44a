//! EyeLink ASC log model
//!
//! An ASC file is the textual export of an EyeLink recording session. It is a
//! flat sequence of lines mixing device header lines, `MSG` messages,
//! eye-movement markers and tab-separated numeric sample rows.
//!
//! # Structure
//!
//! - `line` - Classifying a single line and pulling timestamps out of it
//! - `reader` - Loading the line sequence from files, readers and strings

pub mod line;
mod reader;

pub use line::{EyeMovementKind, LineKind};

/// A fully loaded ASC log.
///
/// Lines are stored without their trailing newline. The log is immutable
/// once loaded; every extractor walks it independently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AscLog {
    pub lines: Vec<String>,
}

impl AscLog {
    /// Number of lines in the log.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Iterate over the lines as string slices.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Iterate over the lines together with their classification.
    pub fn classified(&self) -> impl Iterator<Item = (LineKind, &str)> {
        self.iter().map(|line| (LineKind::classify(line), line))
    }
}
