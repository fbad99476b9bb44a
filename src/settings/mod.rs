//! Eye-tracking sidecar settings.
//!
//! [`Settings`] is the closed set of BIDS eye-tracking sidecar fields. Every
//! field starts out `null`; the ASC extractor fills what the device log
//! reveals and the overlays fill the rest from side files.
//!
//! # Structure
//!
//! - `extract` - Single forward pass over an ASC log
//! - `overlay` - Merging values from JSON side files and info tables

mod extract;
mod overlay;

pub use extract::SettingsExtractor;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Value Types
// ============================================================================

/// Screen geometry value: a list of numbers, a single number or a text
/// placeholder such as `"n/a"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dimension {
    Values(Vec<f64>),
    Value(f64),
    Text(String),
}

/// One entry of `IncludedEyeMovementEvents`, written as `[label, token]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct IncludedEvent {
    pub label: String,
    pub token: String,
}

impl From<(String, String)> for IncludedEvent {
    fn from((label, token): (String, String)) -> Self {
        Self { label, token }
    }
}

impl From<IncludedEvent> for (String, String) {
    fn from(event: IncludedEvent) -> Self {
        (event.label, event.token)
    }
}

type CalibrationTuple = (String, String, Option<f64>, Option<f64>, Option<f64>);

/// One structured calibration validation.
///
/// Written as `[type, eye, max_error, avg_error, relative_time]`. Numeric
/// parts that could not be decoded from the log are `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CalibrationTuple", into = "CalibrationTuple")]
pub struct CalibrationEntry {
    pub calibration_type: String,
    pub recorded_eye: String,
    pub max_error: Option<f64>,
    pub avg_error: Option<f64>,
    /// `(validation timestamp - first trial start) / SamplingFrequency`
    pub relative_time: Option<f64>,
}

impl From<CalibrationTuple> for CalibrationEntry {
    fn from(
        (calibration_type, recorded_eye, max_error, avg_error, relative_time): CalibrationTuple,
    ) -> Self {
        Self {
            calibration_type,
            recorded_eye,
            max_error,
            avg_error,
            relative_time,
        }
    }
}

impl From<CalibrationEntry> for CalibrationTuple {
    fn from(entry: CalibrationEntry) -> Self {
        (
            entry.calibration_type,
            entry.recorded_eye,
            entry.max_error,
            entry.avg_error,
            entry.relative_time,
        )
    }
}

// ============================================================================
// Settings
// ============================================================================

/// BIDS eye-tracking sidecar.
///
/// The key set is fixed: serialising always yields exactly [`Settings::KEYS`],
/// with `null` for unknown values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Settings {
    pub task_name: Option<String>,
    pub institution_name: Option<String>,
    pub institution_address: Option<String>,
    pub manufacturer: Option<String>,
    pub manufacturers_model_name: Option<String>,
    pub software_version: Option<String>,
    pub task_description: Option<String>,
    pub instructions: Option<String>,
    #[serde(rename = "CogAtlasID")]
    pub cog_atlas_id: Option<String>,
    #[serde(rename = "CogPOID")]
    pub cog_po_id: Option<String>,
    pub device_serial_number: Option<String>,

    pub sampling_frequency: Option<f64>,
    pub sample_coordinate_unit: Option<String>,
    pub sample_coordinate_system: Option<String>,
    pub environment_coordinates: Option<String>,
    pub screen_size: Option<Dimension>,
    pub screen_resolution: Option<Dimension>,
    pub screen_distance: Option<Dimension>,

    pub included_eye_movement_events: Option<Vec<IncludedEvent>>,
    pub detection_algorithm: Option<String>,
    pub detection_algorithm_settings: Option<Value>,
    pub start_message: Option<Vec<String>>,
    pub end_message: Option<Vec<String>>,
    pub key_press_message: Option<String>,
    pub calibration_type: Option<String>,
    pub calibration_unit: Option<String>,
    pub calibration_position: Option<Value>,
    pub maximal_calibration_error: Option<f64>,
    pub average_calibration_error: Option<f64>,
    pub calibration_list: Option<Vec<CalibrationEntry>>,
    pub recorded_eye: Option<String>,
    pub eye_camera_settings: Option<Value>,
    pub feature_detection_settings: Option<Value>,
    pub gaze_mapping_settings: Option<Value>,
    pub raw_data_filters: Option<String>,
    pub screen_refresh_rate: Option<f64>,
    #[serde(rename = "AOIDefinition")]
    pub aoi_definition: Option<Value>,
    pub pupil_fit_method: Option<String>,
}

impl Settings {
    /// Every key of the sidecar, in serialisation order.
    pub const KEYS: [&'static str; 38] = [
        "TaskName",
        "InstitutionName",
        "InstitutionAddress",
        "Manufacturer",
        "ManufacturersModelName",
        "SoftwareVersion",
        "TaskDescription",
        "Instructions",
        "CogAtlasID",
        "CogPOID",
        "DeviceSerialNumber",
        "SamplingFrequency",
        "SampleCoordinateUnit",
        "SampleCoordinateSystem",
        "EnvironmentCoordinates",
        "ScreenSize",
        "ScreenResolution",
        "ScreenDistance",
        "IncludedEyeMovementEvents",
        "DetectionAlgorithm",
        "DetectionAlgorithmSettings",
        "StartMessage",
        "EndMessage",
        "KeyPressMessage",
        "CalibrationType",
        "CalibrationUnit",
        "CalibrationPosition",
        "MaximalCalibrationError",
        "AverageCalibrationError",
        "CalibrationList",
        "RecordedEye",
        "EyeCameraSettings",
        "FeatureDetectionSettings",
        "GazeMappingSettings",
        "RawDataFilters",
        "ScreenRefreshRate",
        "AOIDefinition",
        "PupilFitMethod",
    ];

    /// Keys that a valid sidecar must fill.
    pub const REQUIRED: [&'static str; 8] = [
        "TaskName",
        "SamplingFrequency",
        "SampleCoordinateUnit",
        "SampleCoordinateSystem",
        "EnvironmentCoordinates",
        "ScreenSize",
        "ScreenResolution",
        "ScreenDistance",
    ];

    /// All fields null.
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `key` belongs to the sidecar.
    pub fn is_key(key: &str) -> bool {
        Self::KEYS.contains(&key)
    }

    /// Required keys that are still null or empty.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let map = self.to_json_map();
        Self::REQUIRED
            .iter()
            .copied()
            .filter(|key| map.get(*key).map_or(true, is_blank))
            .collect()
    }

    /// Sidecar as a JSON object holding every key.
    pub fn to_json_map(&self) -> serde_json::Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            // Struct of Options always serialises to an object
            _ => serde_json::Map::new(),
        }
    }

    /// Pretty JSON rendering used for the sidecar file.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Look up a single value by its sidecar key.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.to_json_map()
            .remove(key)
            .filter(|value| !value.is_null())
    }

    /// Tokens of the eye-movement events seen in the log.
    pub fn eye_movement_tokens(&self) -> Vec<&str> {
        self.included_eye_movement_events
            .iter()
            .flatten()
            .map(|event| event.token.as_str())
            .collect()
    }
}

/// Null, empty strings and empty containers count as "not filled".
pub(crate) fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}
