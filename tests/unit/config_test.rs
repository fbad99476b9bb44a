//! Unit tests for config module

use ascbids::Config;

#[test]
fn default_config_has_expected_values() {
    let config = Config::default();
    assert_eq!(config.conversion.start_message, "TRIALID");
    assert!(config.conversion.end_message.is_none());
    assert!(config.conversion.saved_events.is_empty());
    assert_eq!(config.output.directory, "bids");
    assert!(config.output.compress_samples);
    assert!(config.output.copy_source);
    assert!(config.batch.workers.is_none());
    assert!(config.batch.info_file.is_none());
}

#[test]
fn config_serialization_roundtrip() {
    let mut config = Config::default();
    config.conversion.end_message = Some("TRIAL_RESULT".to_string());
    config.batch.workers = Some(2);
    let toml_str = toml::to_string_pretty(&config).unwrap();
    let parsed: Config = toml::from_str(&toml_str).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn unset_options_are_not_written() {
    let toml_str = toml::to_string_pretty(&Config::default()).unwrap();
    assert!(!toml_str.contains("end_message"));
    assert!(!toml_str.contains("workers"));
    assert!(!toml_str.contains("info_file"));
    assert!(toml_str.contains("start_message = \"TRIALID\""));
}

#[test]
fn output_config_defaults_when_missing() {
    let toml_str = r#"
[conversion]
start_message = "START_TRIAL"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.conversion.start_message, "START_TRIAL");
    assert!(config.output.compress_samples);
    assert_eq!(config.output.directory, "bids");
}

#[test]
fn configured_markers_reach_parse_options() {
    let config: Config = toml::from_str(
        r#"
[conversion]
start_message = "START_TRIAL"
end_message = "STOP_TRIAL"
saved_events = ["FLIP"]
"#,
    )
    .unwrap();
    let options = config.parse_options(None, None, &[]).unwrap();
    assert_eq!(options.start_message(), "START_TRIAL");
    assert_eq!(options.end_message(), Some("STOP_TRIAL"));
    assert_eq!(options.saved_events(), &["FLIP".to_string()]);
}
