//! BIDS entity labels and the paths built from them.

use std::path::{Path, PathBuf};

use deunicode::deunicode;

use crate::error::Error;

/// Reduce a label to `[A-Za-z0-9]`.
///
/// Unicode is transliterated first, so `"Élodie"` becomes `"Elodie"` and
/// `"faces n-back"` becomes `"facesnback"`.
pub fn sanitize_label(input: &str) -> String {
    deunicode(input)
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

/// Entity labels of one recording.
///
/// Only the participant is required; every other entity is left out of the
/// names when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidsEntities {
    participant: String,
    session: Option<String>,
    task: Option<String>,
    acquisition: Option<String>,
    run: Option<String>,
}

impl BidsEntities {
    /// # Errors
    ///
    /// Returns [`Error::InvalidLabel`] if the participant label has no
    /// alphanumeric characters.
    pub fn new(participant: &str) -> Result<Self, Error> {
        let label = sanitize_label(participant);
        if label.is_empty() {
            return Err(Error::InvalidLabel {
                entity: "sub",
                value: participant.to_string(),
            });
        }
        Ok(Self {
            participant: label,
            session: None,
            task: None,
            acquisition: None,
            run: None,
        })
    }

    pub fn with_session(mut self, session: Option<&str>) -> Self {
        self.session = optional_label(session);
        self
    }

    pub fn with_task(mut self, task: Option<&str>) -> Self {
        self.task = optional_label(task);
        self
    }

    pub fn with_acquisition(mut self, acquisition: Option<&str>) -> Self {
        self.acquisition = optional_label(acquisition);
        self
    }

    pub fn with_run(mut self, run: Option<&str>) -> Self {
        self.run = optional_label(run);
        self
    }

    pub fn participant(&self) -> &str {
        &self.participant
    }

    pub fn task(&self) -> Option<&str> {
        self.task.as_deref()
    }

    /// `sub-<id>[/ses-<ses>]/eyetrack` under `root`.
    pub fn directory(&self, root: &Path) -> PathBuf {
        let mut dir = root.join(format!("sub-{}", self.participant));
        if let Some(session) = &self.session {
            dir = dir.join(format!("ses-{}", session));
        }
        dir.join("eyetrack")
    }

    /// `sub-<id>[_ses-<ses>][_task-<task>][_acq-<acq>][_run-<run>]`
    pub fn file_stem(&self) -> String {
        let mut stem = format!("sub-{}", self.participant);
        let optional = [
            ("ses", &self.session),
            ("task", &self.task),
            ("acq", &self.acquisition),
            ("run", &self.run),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                stem.push_str(&format!("_{}-{}", key, value));
            }
        }
        stem
    }
}

/// Sanitised label, `None` when nothing is left.
fn optional_label(value: Option<&str>) -> Option<String> {
    value.map(sanitize_label).filter(|label| !label.is_empty())
}
