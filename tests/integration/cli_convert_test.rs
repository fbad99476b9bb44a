//! CLI tests for `ascbids convert` and `ascbids inspect`

use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::helpers::{ascbids, fixture, read};

#[test]
fn convert_writes_bids_files() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("bids");

    ascbids(&temp)
        .arg("convert")
        .arg(fixture("monocular.asc"))
        .args(["-p", "01", "--task", "search", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("sub-01_task-search_eyetrack.json"))
        .stdout(predicate::str::contains("sub-01_task-search_eyetrack.tsv.gz"))
        .stdout(predicate::str::contains("sub-01_task-search_events.tsv"))
        .stdout(predicate::str::contains("sub-01_task-search_eyetrack.asc"));

    let dir = out.join("sub-01/eyetrack");
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 4);
}

#[test]
fn convert_applies_settings_events_and_switches() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("bids");

    ascbids(&temp)
        .arg("convert")
        .arg(fixture("monocular.asc"))
        .args(["-p", "01", "--ses", "2", "-e", "TRIAL_RESULT", "--event", "STIM_ON"])
        .arg("--settings")
        .arg(fixture("screen_settings.json"))
        .arg("--events")
        .arg(fixture("monocular_events.tsv"))
        .args(["--no-compress", "--no-copy", "-o"])
        .arg(&out)
        .assert()
        .success();

    let dir = out.join("sub-01/ses-2/eyetrack");
    assert!(dir.join("sub-01_ses-2_eyetrack.tsv").exists());
    assert!(!dir.join("sub-01_ses-2_eyetrack.tsv.gz").exists());
    assert!(!dir.join("sub-01_ses-2_eyetrack.asc").exists());

    let sidecar: Value =
        serde_json::from_str(&read(&dir.join("sub-01_ses-2_eyetrack.json"))).unwrap();
    assert_eq!(sidecar["TaskName"], json!("visual search"));
    assert_eq!(sidecar["EndMessage"], json!(["TRIAL_RESULT 0", "TRIAL_RESULT 1"]));

    let events = read(&dir.join("sub-01_ses-2_events.tsv"));
    assert!(events.lines().next().unwrap().contains("STIM_ON"));
    assert!(events.contains("left"));
}

#[test]
fn convert_uses_configured_markers() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("config.toml"),
        "[conversion]\nstart_message = \"TRIALID\"\nend_message = \"TRIAL_RESULT\"\n\n\
         [output]\ncompress_samples = false\n",
    )
    .unwrap();
    let out = temp.path().join("bids");

    ascbids(&temp)
        .arg("convert")
        .arg(fixture("monocular.asc"))
        .args(["-p", "01", "--task", "search", "-o"])
        .arg(&out)
        .assert()
        .success();

    let dir = out.join("sub-01/eyetrack");
    assert!(dir.join("sub-01_task-search_eyetrack.tsv").exists());
    let sidecar: Value =
        serde_json::from_str(&read(&dir.join("sub-01_task-search_eyetrack.json"))).unwrap();
    assert_eq!(sidecar["EndMessage"], json!(["TRIAL_RESULT 0", "TRIAL_RESULT 1"]));
}

#[test]
fn convert_requires_a_participant() {
    let temp = TempDir::new().unwrap();
    ascbids(&temp)
        .arg("convert")
        .arg(fixture("monocular.asc"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("--participant"));
}

#[test]
fn convert_rejects_unlabelled_participant() {
    let temp = TempDir::new().unwrap();
    ascbids(&temp)
        .arg("convert")
        .arg(fixture("monocular.asc"))
        .args(["--participant=__", "-o"])
        .arg(temp.path().join("bids"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid sub label"));
}

#[test]
fn convert_reports_missing_start_message() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("bids");
    ascbids(&temp)
        .arg("convert")
        .arg(fixture("monocular.asc"))
        .args(["-p", "01", "-s", "NO_SUCH_MARKER", "-o"])
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("NO_SUCH_MARKER"));
    assert!(!out.exists());
}

#[test]
fn inspect_prints_a_summary() {
    let temp = TempDir::new().unwrap();
    ascbids(&temp)
        .arg("inspect")
        .arg(fixture("binocular_vel.asc"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Sampling frequency: 1000.0"))
        .stdout(predicate::str::contains("Recorded eye:       Both"))
        .stdout(predicate::str::contains("Trials:             2"));
}

#[test]
fn inspect_lists_trials() {
    let temp = TempDir::new().unwrap();
    ascbids(&temp)
        .arg("inspect")
        .arg(fixture("monocular.asc"))
        .arg("--trials")
        .assert()
        .success()
        .stdout(predicate::str::contains("TRIALID 1"))
        .stdout(predicate::str::contains("TRIALID 2"));
}

#[test]
fn inspect_json_is_machine_readable() {
    let temp = TempDir::new().unwrap();
    let output = ascbids(&temp)
        .arg("inspect")
        .arg(fixture("monocular.asc"))
        .args(["--json", "--event", "STIM_ON"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["samples"], json!(11));
    assert_eq!(value["events"][0]["STIM_ON"], json!(1005));
    assert_eq!(value["settings"]["Manufacturer"], json!("SR-Research"));
}
