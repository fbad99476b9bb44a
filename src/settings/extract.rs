//! Settings extraction from ASC logs.
//!
//! One forward pass runs every device keyword probe against every line.
//! Probes are independent substring tests: a single line may feed several
//! fields (the `SAMPLES` line carries both the rate and the filter level).
//! A probe whose payload does not decode is skipped; only the absence of
//! any start message aborts the pass.

use tracing::debug;

use super::{CalibrationEntry, Dimension, IncludedEvent, Settings};
use crate::asc::line::{self, LineKind};
use crate::asc::AscLog;
use crate::error::Error;

/// Value written to `Manufacturer` and `DetectionAlgorithm` for EyeLink logs.
pub const MANUFACTURER: &str = "SR-Research";

/// Extracts [`Settings`] from an ASC log.
#[derive(Debug, Clone)]
pub struct SettingsExtractor<'a> {
    start_message: &'a str,
    end_message: Option<&'a str>,
}

/// Mutable state of one extraction pass.
struct Pass<'a> {
    settings: Settings,
    /// Timestamp of the first start message.
    t0: Option<i64>,
    raw_calibrations: Vec<&'a str>,
}

impl<'a> SettingsExtractor<'a> {
    pub fn new(start_message: &'a str, end_message: Option<&'a str>) -> Self {
        Self {
            start_message,
            end_message,
        }
    }

    /// Extract settings into a fresh [`Settings`] record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingStartMessage`] if no line contains the
    /// configured start message.
    pub fn extract(&self, log: &AscLog) -> Result<Settings, Error> {
        self.extract_into(log, Settings::new())
    }

    /// Extract settings on top of an existing record.
    ///
    /// Scalar fields found in the log overwrite what `base` holds; list
    /// fields are appended to.
    pub fn extract_into(&self, log: &AscLog, base: Settings) -> Result<Settings, Error> {
        let mut pass = Pass {
            settings: base,
            t0: None,
            raw_calibrations: Vec::new(),
        };
        pass.settings.manufacturer = Some(MANUFACTURER.to_string());
        pass.settings.detection_algorithm = Some(MANUFACTURER.to_string());

        for (kind, l) in log.classified() {
            pass.probe_device(l);
            pass.probe_kind(kind, l);
            self.probe_messages(&mut pass, l);
        }

        let started = pass
            .settings
            .start_message
            .as_ref()
            .is_some_and(|messages| !messages.is_empty());
        if !started {
            return Err(Error::MissingStartMessage {
                marker: self.start_message.to_string(),
            });
        }

        pass.finish_calibrations();
        Ok(pass.settings)
    }

    fn probe_messages(&self, pass: &mut Pass<'_>, l: &str) {
        if let Some(text) = marker_text(l, self.start_message) {
            if pass.t0.is_none() {
                pass.t0 = line::message_timestamp(l);
            }
            push_distinct(&mut pass.settings.start_message, text);
        }

        if let Some(end_message) = self.end_message {
            if let Some(text) = marker_text(l, end_message) {
                push_distinct(&mut pass.settings.end_message, text);
            }
        }
    }
}

impl<'a> Pass<'a> {
    /// Device header keyword probes.
    fn probe_device(&mut self, l: &str) {
        let settings = &mut self.settings;

        if l.contains("** EYELINK") {
            if let Some(model) = l.get(3..) {
                settings.manufacturers_model_name = Some(model.to_string());
            }
        }

        if let Some((_, version)) = l.split_once("VERSION: ") {
            settings.software_version = Some(version.to_string());
        }

        if let Some((_, serial)) = l.split_once("SERIAL NUMBER: ") {
            settings.device_serial_number = Some(serial.to_string());
        }

        if let Some((_, camera)) = l.split_once("CAMERA: ") {
            settings.eye_camera_settings = Some(camera.to_string().into());
        }

        if l.contains("DISPLAY_COORDS") {
            match display_resolution(l) {
                Some(resolution) => settings.screen_resolution = Some(resolution),
                None => debug!(line = l, "undecodable DISPLAY_COORDS"),
            }
        }

        if let Some((_, method)) = l.rsplit_once("ELCL_PROC ") {
            settings.pupil_fit_method = Some(method.to_string());
        }

        if let Some((_, rest)) = l.split_once("CALIBRATION ") {
            if let Some(kind) = rest.split(' ').next().filter(|k| !k.is_empty()) {
                settings.calibration_type = Some(kind.to_string());
            }
        }

        if let Some(rate) = keyword_field(l, "RATE") {
            match rate.parse::<f64>() {
                Ok(rate) => settings.sampling_frequency = Some(rate),
                Err(_) => debug!(line = l, "undecodable RATE"),
            }
        }

        if let Some(code) = keyword_field(l, "FILTER") {
            match code.parse::<u8>().ok().and_then(filter_name) {
                Some(name) => settings.raw_data_filters = Some(name.to_string()),
                None => debug!(line = l, "undecodable FILTER"),
            }
        }
    }

    /// Probes driven by the line category.
    fn probe_kind(&mut self, kind: LineKind, l: &'a str) {
        let settings = &mut self.settings;

        match kind {
            LineKind::SamplesHeader => {
                let coordinates = if l.contains("GAZE") {
                    Some(("gaze-on-screen", "pixels"))
                } else if l.contains("HREF") {
                    Some(("eye-in-head", "degree"))
                } else if l.contains("PUPIL") {
                    Some(("eye-in-camera", "data raw"))
                } else {
                    None
                };
                if let Some((system, unit)) = coordinates {
                    settings.sample_coordinate_system = Some(system.to_string());
                    settings.sample_coordinate_unit = Some(unit.to_string());
                }

                let eye = match (l.contains("LEFT"), l.contains("RIGHT")) {
                    (true, true) => Some("Both"),
                    (true, false) => Some("Left"),
                    (false, true) => Some("Right"),
                    (false, false) => None,
                };
                if let Some(eye) = eye {
                    settings.recorded_eye = Some(eye.to_string());
                }
            }
            LineKind::EyeMovement(movement) => {
                let events = settings.included_eye_movement_events.get_or_insert_with(Vec::new);
                if !events.iter().any(|e| e.token == movement.token()) {
                    events.push(IncludedEvent {
                        label: movement.label().to_string(),
                        token: movement.token().to_string(),
                    });
                }
            }
            LineKind::CalibrationValidation => self.raw_calibrations.push(l),
            _ => {}
        }
    }

    /// Turn the raw validation lines into structured entries.
    fn finish_calibrations(&mut self) {
        if self.raw_calibrations.is_empty() {
            return;
        }

        let rate = self.settings.sampling_frequency;
        let t0 = self.t0;
        let entries: Vec<CalibrationEntry> = self
            .raw_calibrations
            .iter()
            .map(|l| parse_calibration(l, t0, rate))
            .collect();

        self.settings
            .calibration_list
            .get_or_insert_with(Vec::new)
            .extend(entries);
    }
}

/// Parse one `!CAL VALIDATION` line.
///
/// ```text
/// MSG	7017000 !CAL VALIDATION HV9 R RIGHT GOOD ERROR 0.35 avg. 0.80 max
/// ```
pub fn parse_calibration(l: &str, t0: Option<i64>, rate: Option<f64>) -> CalibrationEntry {
    let calibration_type = l
        .split_once("VALIDATION ")
        .and_then(|(_, rest)| rest.split(' ').next())
        .unwrap_or_default()
        .to_string();

    let recorded_eye = word_before(l, " GOOD").unwrap_or_default().to_string();
    let max_error = word_before(l, " max").and_then(|w| w.parse().ok());
    let avg_error = word_before(l, " avg.").and_then(|w| w.parse().ok());

    let relative_time = match (line::message_timestamp(l), t0, rate) {
        (Some(ts), Some(t0), Some(rate)) if rate != 0.0 => Some((ts as f64 - t0 as f64) / rate),
        _ => None,
    };

    CalibrationEntry {
        calibration_type,
        recorded_eye,
        max_error,
        avg_error,
        relative_time,
    }
}

/// Last space separated word before the first occurrence of `marker`.
fn word_before<'l>(l: &'l str, marker: &str) -> Option<&'l str> {
    let (before, _) = l.split_once(marker)?;
    before.split(' ').last().filter(|w| !w.is_empty())
}

/// First non-empty tab field after `keyword`.
///
/// Handles both `RATE\t 500.00` inside a `SAMPLES` line and the
/// stand-alone `RATE\t\t500.0` form.
fn keyword_field<'l>(l: &'l str, keyword: &str) -> Option<&'l str> {
    let (_, rest) = l.split_once(keyword)?;
    rest.split('\t').map(str::trim).find(|field| !field.is_empty())
}

/// `ScreenResolution` from `DISPLAY_COORDS <x0> <y0> <x1> <y1>`.
///
/// Pixel ranges are inclusive, hence the `+ 1`.
fn display_resolution(l: &str) -> Option<Dimension> {
    let mut words = l.split_whitespace().rev();
    let height: f64 = words.next()?.parse().ok()?;
    let width: f64 = words.next()?.parse().ok()?;
    Some(Dimension::Values(vec![width + 1.0, height + 1.0]))
}

fn filter_name(code: u8) -> Option<&'static str> {
    match code {
        0 => Some("off"),
        1 => Some("standard"),
        2 => Some("extra"),
        _ => None,
    }
}

/// Message text starting at `marker`, if the line contains it.
fn marker_text(l: &str, marker: &str) -> Option<String> {
    let (_, after) = l.split_once(marker)?;
    Some(format!("{}{}", marker, after))
}

fn push_distinct(list: &mut Option<Vec<String>>, value: String) {
    let list = list.get_or_insert_with(Vec::new);
    if !list.contains(&value) {
        list.push(value);
    }
}
