//! Unit tests for settings extraction over complete recordings

use ascbids::settings::{Dimension, SettingsExtractor};
use ascbids::Settings;

use crate::helpers::{load_fixture, load_log};

fn monocular() -> Settings {
    SettingsExtractor::new("TRIALID", Some("TRIAL_RESULT"))
        .extract(&load_log("monocular.asc"))
        .unwrap()
}

#[test]
fn device_header_fields() {
    let settings = monocular();
    assert_eq!(settings.manufacturer.as_deref(), Some("SR-Research"));
    assert_eq!(settings.manufacturers_model_name.as_deref(), Some("EYELINK 1000 Plus"));
    assert_eq!(settings.software_version.as_deref(), Some("EYELINK II 1"));
    assert_eq!(settings.device_serial_number.as_deref(), Some("CLU-ABC12"));
    assert_eq!(settings.pupil_fit_method.as_deref(), Some("CENTROID (3)"));
    assert_eq!(settings.calibration_type.as_deref(), Some("HV9"));
}

#[test]
fn recording_fields() {
    let settings = monocular();
    assert_eq!(settings.sampling_frequency, Some(500.0));
    assert_eq!(settings.raw_data_filters.as_deref(), Some("extra"));
    assert_eq!(settings.recorded_eye.as_deref(), Some("Left"));
    assert_eq!(settings.sample_coordinate_system.as_deref(), Some("gaze-on-screen"));
    assert_eq!(settings.sample_coordinate_unit.as_deref(), Some("pixels"));
    assert_eq!(
        settings.screen_resolution,
        Some(Dimension::Values(vec![1920.0, 1080.0]))
    );
}

#[test]
fn trial_markers_are_collected_once_each() {
    let settings = monocular();
    assert_eq!(
        settings.start_message,
        Some(vec!["TRIALID 1".to_string(), "TRIALID 2".to_string()])
    );
    assert_eq!(
        settings.end_message,
        Some(vec!["TRIAL_RESULT 0".to_string(), "TRIAL_RESULT 1".to_string()])
    );
}

#[test]
fn eye_movement_events_in_order_of_appearance() {
    let settings = monocular();
    assert_eq!(
        settings.eye_movement_tokens(),
        vec!["SFIX", "EFIX", "SSACC", "ESACC", "SBLINK", "EBLINK"]
    );
}

#[test]
fn calibration_is_relative_to_first_trial() {
    let settings = monocular();
    let calibrations = settings.calibration_list.unwrap();
    assert_eq!(calibrations.len(), 1);
    let entry = &calibrations[0];
    assert_eq!(entry.calibration_type, "HV9");
    assert_eq!(entry.recorded_eye, "LEFT");
    assert_eq!(entry.avg_error, Some(0.35));
    assert_eq!(entry.max_error, Some(0.80));
    assert_eq!(entry.relative_time, Some(-70.0 / 500.0));
}

#[test]
fn binocular_recording() {
    let settings = SettingsExtractor::new("TRIALID", None)
        .extract(&load_log("binocular_vel.asc"))
        .unwrap();
    assert_eq!(settings.recorded_eye.as_deref(), Some("Both"));
    assert_eq!(settings.sampling_frequency, Some(1000.0));
    assert_eq!(settings.raw_data_filters.as_deref(), Some("standard"));
    assert_eq!(settings.end_message, None);
    assert_eq!(settings.calibration_list, None);
}

#[test]
fn missing_start_message_is_a_configuration_error() {
    let err = SettingsExtractor::new("NO_SUCH_MARKER", None)
        .extract(&load_log("monocular.asc"))
        .unwrap_err();
    assert!(err.is_configuration_error());
    assert!(err.to_string().contains("NO_SUCH_MARKER"));
}

#[test]
fn settings_json_overlay_fills_and_drops() {
    let mut settings = monocular();
    let ignored = settings
        .overlay_json_str(&load_fixture("screen_settings.json"))
        .unwrap();

    assert_eq!(ignored, vec!["NotASidecarKey".to_string()]);
    assert_eq!(settings.task_name.as_deref(), Some("visual search"));
    assert_eq!(settings.environment_coordinates.as_deref(), Some("top-left"));
    assert_eq!(settings.screen_distance, Some(Dimension::Value(0.6)));
    // null never overwrites
    assert_eq!(settings.sample_coordinate_system.as_deref(), Some("gaze-on-screen"));
    assert!(settings.missing_required().is_empty());
}

#[test]
fn sidecar_always_has_every_key() {
    let map = monocular().to_json_map();
    assert_eq!(map.len(), Settings::KEYS.len());
    assert!(map["TaskName"].is_null());
}
