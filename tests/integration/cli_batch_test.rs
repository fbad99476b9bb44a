//! CLI tests for `ascbids batch`

use predicates::prelude::*;
use std::fs;

use crate::helpers::{ascbids, read, temp_dataset};

#[test]
fn batch_converts_the_dataset() {
    let (temp, root) = temp_dataset();
    let out = temp.path().join("bids");

    ascbids(&temp)
        .arg("batch")
        .arg(&root)
        .args(["-j", "2", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Converted 3 files"))
        .stdout(predicate::str::contains("task-search_participants.tsv"));

    assert!(out
        .join("sub-01/ses-1/eyetrack/sub-01_ses-1_task-search_eyetrack.tsv.gz")
        .exists());
    assert!(out
        .join("sub-01/ses-2/eyetrack/sub-01_ses-2_task-search_eyetrack.tsv.gz")
        .exists());
    assert!(out
        .join("sub-02/ses-1/eyetrack/sub-02_ses-1_task-search_eyetrack.tsv.gz")
        .exists());
    assert_eq!(
        read(&out.join("task-search_participants.tsv")),
        "participant_id\tage\n01\t24\n02\t31\n"
    );
}

#[test]
fn batch_finds_a_renamed_info_table() {
    let (temp, root) = temp_dataset();
    fs::rename(root.join("infoFiles.tsv"), root.join("sessions.tsv")).unwrap();
    let out = temp.path().join("bids");

    ascbids(&temp)
        .arg("batch")
        .arg(&root)
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Converted 3 files"));

    ascbids(&temp)
        .arg("batch")
        .arg(&root)
        .args(["--info-file", "missing.tsv", "-o"])
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.tsv"));
}

#[test]
fn init_writes_starter_files_next_to_the_data() {
    let (temp, root) = temp_dataset();

    ascbids(&temp)
        .arg("init")
        .arg(&root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    ascbids(&temp)
        .arg("init")
        .arg(&root)
        .arg("--force")
        .assert()
        .success()
        .stdout(predicate::str::contains("settings.json"))
        .stdout(predicate::str::contains("participant_id"));

    let table = read(&root.join("infoFiles.tsv"));
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("filename\tfilepath\teventsfilename\tparticipant_id"));
    assert!(lines[1].starts_with("s01_a.asc\traw/sub01\t"));
    assert!(lines[3].starts_with("s02_a.asc\traw/sub02\t"));

    let template: serde_json::Value =
        serde_json::from_str(&read(&root.join("settings.json"))).unwrap();
    assert!(template["ScreenDistance"].is_null());

    // participant labels are left for the user
    ascbids(&temp)
        .arg("batch")
        .arg(&root)
        .arg("-o")
        .arg(temp.path().join("bids"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("participant_id"));
}

#[test]
fn batch_rejects_unlisted_files_before_converting() {
    let (temp, root) = temp_dataset();
    fs::copy(root.join("raw/sub01/s01_a.asc"), root.join("raw/stray.asc")).unwrap();
    let out = temp.path().join("bids");

    ascbids(&temp)
        .arg("batch")
        .arg(&root)
        .arg("-o")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("stray.asc"));

    assert!(!out.exists());
}

#[test]
fn batch_reports_failures_after_converting_the_rest() {
    let (temp, root) = temp_dataset();
    fs::write(root.join("raw/sub02/s02_a.asc"), "MSG\t1000 SYNCTIME\n").unwrap();
    let out = temp.path().join("bids");

    ascbids(&temp)
        .arg("batch")
        .arg(&root)
        .arg("-o")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("s02_a.asc"))
        .stderr(predicate::str::contains("1 of 3 files failed to convert"));

    assert!(out.join("sub-01/ses-1/eyetrack").exists());
    assert!(out.join("sub-01/ses-2/eyetrack").exists());
    assert!(!out.join("sub-02").exists());
}

#[test]
fn batch_settings_reach_every_file() {
    let (temp, root) = temp_dataset();
    let settings = temp.path().join("screen.json");
    fs::write(&settings, r#"{"ScreenSize": [0.47, 0.3], "ScreenDistance": 0.5}"#).unwrap();
    let out = temp.path().join("bids");

    ascbids(&temp)
        .arg("batch")
        .arg(&root)
        .arg("--settings")
        .arg(&settings)
        .args(["--no-compress", "-o"])
        .arg(&out)
        .assert()
        .success();

    for stem in [
        "sub-01/ses-1/eyetrack/sub-01_ses-1_task-search",
        "sub-02/ses-1/eyetrack/sub-02_ses-1_task-search",
    ] {
        let sidecar: serde_json::Value =
            serde_json::from_str(&read(&out.join(format!("{}_eyetrack.json", stem)))).unwrap();
        assert_eq!(sidecar["ScreenSize"], serde_json::json!([0.47, 0.3]));
        assert_eq!(sidecar["ScreenDistance"], serde_json::json!(0.6));
        assert!(out.join(format!("{}_eyetrack.tsv", stem)).exists());
    }
}
