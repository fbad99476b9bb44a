//! Dataset conversion through the library

use serde_json::{json, Value};
use std::fs;

use ascbids::batch::{load_info, Batch};
use ascbids::bids::{BidsWriter, TsvTable, DEFAULT_INFO_FILE};
use ascbids::{Converter, ParseOptions};

use crate::helpers::{read, temp_dataset};

fn converter() -> Converter {
    Converter::new(ParseOptions::new("TRIALID").unwrap())
}

#[test]
fn info_table_splits_participant_and_file_columns() {
    let (_temp, root) = temp_dataset();
    let info = load_info(&root, Some(DEFAULT_INFO_FILE), None).unwrap();
    assert_eq!(info.rows().len(), 3);
    assert_eq!(info.participant_columns(), &["age"]);
    assert_eq!(info.file_columns(), &["ScreenDistance"]);
    assert_eq!(info.participants_filename(), "task-search_participants.tsv");
}

#[test]
fn converts_every_listed_file() {
    let (temp, root) = temp_dataset();
    let out = temp.path().join("bids");
    let info = load_info(&root, Some(DEFAULT_INFO_FILE), None).unwrap();
    let report = Batch::new(&root, info, 2)
        .run(&converter(), &BidsWriter::new(&out))
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.succeeded(), 3);
    for stem in [
        "sub-01/ses-1/eyetrack/sub-01_ses-1_task-search",
        "sub-01/ses-2/eyetrack/sub-01_ses-2_task-search",
        "sub-02/ses-1/eyetrack/sub-02_ses-1_task-search",
    ] {
        for suffix in ["_eyetrack.json", "_eyetrack.tsv.gz", "_events.tsv", "_eyetrack.asc"] {
            let path = out.join(format!("{}{}", stem, suffix));
            assert!(path.exists(), "missing {}", path.display());
        }
    }

    assert_eq!(
        read(&out.join("task-search_participants.tsv")),
        "participant_id\tage\n01\t24\n02\t31\n"
    );
}

#[test]
fn file_columns_and_events_reach_their_file() {
    let (temp, root) = temp_dataset();
    let out = temp.path().join("bids");
    let info = load_info(&root, Some(DEFAULT_INFO_FILE), None).unwrap();
    Batch::new(&root, info, 1)
        .run(&converter(), &BidsWriter::new(&out))
        .unwrap();

    let sidecar = |stem: &str| -> Value {
        serde_json::from_str(&read(&out.join(format!("{}_eyetrack.json", stem)))).unwrap()
    };
    let a = sidecar("sub-01/ses-1/eyetrack/sub-01_ses-1_task-search");
    let b = sidecar("sub-01/ses-2/eyetrack/sub-01_ses-2_task-search");
    assert_eq!(a["ScreenDistance"], json!(0.6));
    assert_eq!(b["ScreenDistance"], json!(0.7));
    assert_eq!(a["TaskName"], json!("search"));

    let events = TsvTable::parse_str(&read(
        &out.join("sub-01/ses-1/eyetrack/sub-01_ses-1_task-search_events.tsv"),
    ));
    assert_eq!(events.cell(&events.rows[1], "response"), Some("right"));

    let plain = TsvTable::parse_str(&read(
        &out.join("sub-01/ses-2/eyetrack/sub-01_ses-2_task-search_events.tsv"),
    ));
    assert!(plain.column("response").is_none());
}

#[test]
fn shared_settings_apply_to_every_file() {
    let (temp, root) = temp_dataset();
    let out = temp.path().join("bids");
    let info = load_info(&root, Some(DEFAULT_INFO_FILE), None).unwrap();
    let shared =
        serde_json::from_str(r#"{"EnvironmentCoordinates": "top-left", "ScreenDistance": 0.5}"#)
            .unwrap();
    Batch::new(&root, info, 2)
        .with_settings(Some(shared))
        .run(&converter(), &BidsWriter::new(&out))
        .unwrap();

    let sidecar: Value = serde_json::from_str(&read(
        &out.join("sub-02/ses-1/eyetrack/sub-02_ses-1_task-search_eyetrack.json"),
    ))
    .unwrap();
    assert_eq!(sidecar["EnvironmentCoordinates"], json!("top-left"));
    // per-file info column beats the shared JSON
    assert_eq!(sidecar["ScreenDistance"], json!(0.6));
}

#[test]
fn renamed_info_table_is_discovered() {
    let (_temp, root) = temp_dataset();
    fs::rename(root.join(DEFAULT_INFO_FILE), root.join("sessions.tsv")).unwrap();
    fs::write(root.join("notes.tsv"), "subject\tcomment\n01\tblinks a lot\n").unwrap();

    let info = load_info(&root, None, None).unwrap();
    assert_eq!(info.rows().len(), 3);
    assert!(load_info(&root, Some(DEFAULT_INFO_FILE), None).is_err());
}

#[test]
fn unlisted_data_file_is_rejected() {
    let (_temp, root) = temp_dataset();
    fs::write(root.join("raw/extra.asc"), "MSG\t1 TRIALID 1\n").unwrap();
    let err = load_info(&root, Some(DEFAULT_INFO_FILE), None).unwrap_err();
    assert!(format!("{:#}", err).contains("extra.asc"));
}

#[test]
fn output_inside_the_input_is_not_checked() {
    let (_temp, root) = temp_dataset();
    let out = root.join("derivatives");
    fs::create_dir_all(out.join("sub-01")).unwrap();
    fs::write(out.join("sub-01/copy_eyetrack.asc"), "").unwrap();
    assert!(load_info(&root, Some(DEFAULT_INFO_FILE), Some(&out)).is_ok());
    assert!(load_info(&root, Some(DEFAULT_INFO_FILE), None).is_err());
}

#[test]
fn broken_file_is_reported_without_stopping_the_batch() {
    let (temp, root) = temp_dataset();
    fs::write(root.join("raw/sub02/s02_a.asc"), "MSG\t1000 SYNCTIME\n").unwrap();
    let out = temp.path().join("bids");
    let info = load_info(&root, Some(DEFAULT_INFO_FILE), None).unwrap();
    let report = Batch::new(&root, info, 2)
        .run(&converter(), &BidsWriter::new(&out))
        .unwrap();

    let failed: Vec<&str> = report.failures().map(|o| o.filename.as_str()).collect();
    assert_eq!(failed, vec!["s02_a.asc"]);
    assert_eq!(report.succeeded(), 2);
    assert!(out.join("task-search_participants.tsv").exists());
}
