//! Line classification for ASC logs.
//!
//! Every ASC line falls into one of a handful of shapes. The classifier only
//! looks at the leading token and a few fixed substrings; it never fails.
//! Device header keywords (`** EYELINK`, `RATE`, `DISPLAY_COORDS`, ...) are
//! not categories here: they are independent probes run by the settings
//! extractor over every line.

/// Category of a single ASC line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `SAMPLES` line declaring the sample column layout
    SamplesHeader,
    /// Numeric sample row (leading integer timestamp)
    Sample,
    /// Fixation, saccade or blink start/end marker
    EyeMovement(EyeMovementKind),
    /// `!CAL VALIDATION ... GOOD` quality report
    CalibrationValidation,
    /// `MSG` line
    Message,
    /// Anything else (comments, device headers, `START`/`END`, inputs, ...)
    Other,
}

impl LineKind {
    /// Classify one line (without its trailing newline).
    ///
    /// Header and comment forms are ruled out before the sample-row test,
    /// since some of them also begin with digits after the first token.
    pub fn classify(line: &str) -> Self {
        let Some(token) = first_token(line) else {
            return LineKind::Other;
        };

        if token == "SAMPLES" {
            return LineKind::SamplesHeader;
        }

        if let Some(kind) = EyeMovementKind::from_token(token) {
            return LineKind::EyeMovement(kind);
        }

        if is_calibration_validation(line) {
            return LineKind::CalibrationValidation;
        }

        if is_message(line) {
            return LineKind::Message;
        }

        if token.parse::<i64>().is_ok() {
            return LineKind::Sample;
        }

        LineKind::Other
    }

    pub fn is_sample(&self) -> bool {
        *self == LineKind::Sample
    }
}

/// Eye-movement event markers written by the EyeLink parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EyeMovementKind {
    StartFixation, // "SFIX"
    EndFixation,   // "EFIX"
    StartSaccade,  // "SSACC"
    EndSaccade,    // "ESACC"
    StartBlink,    // "SBLINK"
    EndBlink,      // "EBLINK"
}

impl EyeMovementKind {
    pub const ALL: [EyeMovementKind; 6] = [
        EyeMovementKind::StartFixation,
        EyeMovementKind::EndFixation,
        EyeMovementKind::StartSaccade,
        EyeMovementKind::EndSaccade,
        EyeMovementKind::StartBlink,
        EyeMovementKind::EndBlink,
    ];

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "SFIX" => Some(EyeMovementKind::StartFixation),
            "EFIX" => Some(EyeMovementKind::EndFixation),
            "SSACC" => Some(EyeMovementKind::StartSaccade),
            "ESACC" => Some(EyeMovementKind::EndSaccade),
            "SBLINK" => Some(EyeMovementKind::StartBlink),
            "EBLINK" => Some(EyeMovementKind::EndBlink),
            _ => None,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            EyeMovementKind::StartFixation => "SFIX",
            EyeMovementKind::EndFixation => "EFIX",
            EyeMovementKind::StartSaccade => "SSACC",
            EyeMovementKind::EndSaccade => "ESACC",
            EyeMovementKind::StartBlink => "SBLINK",
            EyeMovementKind::EndBlink => "EBLINK",
        }
    }

    /// Human readable label used in `IncludedEyeMovementEvents`.
    pub fn label(&self) -> &'static str {
        match self {
            EyeMovementKind::StartFixation => "Start of fixation",
            EyeMovementKind::EndFixation => "End of fixation",
            EyeMovementKind::StartSaccade => "Start of saccade",
            EyeMovementKind::EndSaccade => "End of saccade",
            EyeMovementKind::StartBlink => "Start of blink",
            EyeMovementKind::EndBlink => "End of blink",
        }
    }

    pub fn is_start(&self) -> bool {
        self.token().starts_with('S')
    }
}

/// First whitespace/tab delimited token of a line.
pub fn first_token(line: &str) -> Option<&str> {
    line.split_whitespace().next()
}

/// First tab delimited field of a line (the whole line if it has no tab).
pub fn first_tab_field(line: &str) -> &str {
    line.split('\t').next().unwrap_or(line)
}

/// True for `MSG` lines.
pub fn is_message(line: &str) -> bool {
    first_tab_field(line) == "MSG"
}

/// True for calibration validation reports that passed (`GOOD`).
pub fn is_calibration_validation(line: &str) -> bool {
    line.contains("!CAL VALIDATION") && line.contains("GOOD")
}

/// Integer timestamp that opens the second tab field.
///
/// For `MSG\t7018000 TRIALID 1` this is `7018000`. The same shape is used by
/// `START`, `END` and `INPUT` lines.
pub fn message_timestamp(line: &str) -> Option<i64> {
    let (_, rest) = line.split_once('\t')?;
    rest.split_whitespace().next()?.parse().ok()
}

/// Message text that follows the timestamp.
///
/// For `MSG\t7018000 TRIALID 1` this is `TRIALID 1`.
pub fn message_text(line: &str) -> Option<&str> {
    let (_, rest) = line.split_once('\t')?;
    let (_, text) = rest.trim_start().split_once(' ')?;
    Some(text)
}

/// Timestamp carried by a line, whatever its shape.
///
/// Sample rows carry it as their first token, messages and most other
/// records right after the first tab.
pub fn line_timestamp(line: &str) -> Option<i64> {
    if let Some(ts) = first_token(line).and_then(|t| t.parse::<i64>().ok()) {
        return Some(ts);
    }
    message_timestamp(line)
}
