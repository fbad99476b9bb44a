//! End-to-end conversion of a single recording through the library

use flate2::read::GzDecoder;
use serde_json::{json, Value};
use std::fs::File;
use std::io::Read;
use tempfile::TempDir;

use ascbids::batch::FileJob;
use ascbids::bids::{BidsEntities, BidsWriter, TsvTable};
use ascbids::{Converter, ParseOptions};

use crate::helpers::{fixture, read};

fn converter() -> Converter {
    let options = ParseOptions::new("TRIALID")
        .unwrap()
        .with_end_message(Some("TRIAL_RESULT".to_string()))
        .with_saved_events(vec!["STIM_ON".to_string()]);
    Converter::new(options)
}

fn job() -> FileJob {
    let entities = BidsEntities::new("01")
        .unwrap()
        .with_session(Some("1"))
        .with_task(Some("visual search"));
    let mut job = FileJob::new(fixture("monocular.asc"), entities);
    job.task_name = Some("visual search".to_string());
    job.events = Some(fixture("monocular_events.tsv"));
    job
}

#[test]
fn writes_the_four_outputs_under_the_entity_directory() {
    let out = TempDir::new().unwrap();
    let written = job()
        .run(&converter(), &BidsWriter::new(out.path()))
        .unwrap();

    let dir = out.path().join("sub-01/ses-1/eyetrack");
    let stem = "sub-01_ses-1_task-visualsearch";
    let paths: Vec<_> = written.iter().map(|f| f.path.clone()).collect();
    assert_eq!(
        paths,
        vec![
            dir.join(format!("{}_eyetrack.json", stem)),
            dir.join(format!("{}_eyetrack.tsv.gz", stem)),
            dir.join(format!("{}_events.tsv", stem)),
            dir.join(format!("{}_eyetrack.asc", stem)),
        ]
    );
    assert_eq!(read(&paths[3]), read(&fixture("monocular.asc")));
}

#[test]
fn sidecar_holds_extracted_and_supplied_settings() {
    let out = TempDir::new().unwrap();
    let written = job()
        .run(&converter(), &BidsWriter::new(out.path()))
        .unwrap();

    let sidecar: Value = serde_json::from_str(&read(&written[0].path)).unwrap();
    assert_eq!(sidecar["TaskName"], json!("visual search"));
    assert_eq!(sidecar["SamplingFrequency"], json!(500.0));
    assert_eq!(sidecar["RecordedEye"], json!("Left"));
    assert_eq!(sidecar["ScreenResolution"], json!([1920.0, 1080.0]));
    assert_eq!(sidecar["StartMessage"], json!(["TRIALID 1", "TRIALID 2"]));
    assert_eq!(sidecar["EndMessage"], json!(["TRIAL_RESULT 0", "TRIAL_RESULT 1"]));
    assert_eq!(
        sidecar["IncludedEyeMovementEvents"][0],
        json!(["Start of fixation", "SFIX"])
    );
    assert!(sidecar["ScreenSize"].is_null());
}

#[test]
fn json_overrides_win_over_the_task_label() {
    let out = TempDir::new().unwrap();
    let mut job = job();
    let overrides: Value = serde_json::from_str(&read(&fixture("screen_settings.json"))).unwrap();
    job.json_overrides = match overrides {
        Value::Object(map) => Some(map),
        _ => unreachable!(),
    };
    let recording = job.prepare(&converter()).unwrap();
    assert_eq!(recording.settings.task_name.as_deref(), Some("visual search"));
    assert!(recording.check_required().is_empty());

    let written = job.run(&converter(), &BidsWriter::new(out.path())).unwrap();
    let sidecar: Value = serde_json::from_str(&read(&written[0].path)).unwrap();
    assert_eq!(sidecar["ScreenSize"], json!([0.472, 0.295]));
    assert!(sidecar.get("NotASidecarKey").is_none());
}

#[test]
fn sample_table_is_gzipped_tsv() {
    let out = TempDir::new().unwrap();
    let written = job()
        .run(&converter(), &BidsWriter::new(out.path()))
        .unwrap();

    let mut samples = String::new();
    GzDecoder::new(File::open(&written[1].path).unwrap())
        .read_to_string(&mut samples)
        .unwrap();
    let table = TsvTable::parse_str(&samples);
    assert_eq!(table.header, vec!["time", "xpl", "ypl", "psl"]);
    assert_eq!(table.rows.len(), 11);
    assert_eq!(table.rows[7], vec!["1014", "n/a", "n/a", "0.0"]);
}

#[test]
fn events_table_merges_the_side_file() {
    let out = TempDir::new().unwrap();
    let written = job()
        .run(&converter(), &BidsWriter::new(out.path()))
        .unwrap();

    let table = TsvTable::parse_str(&read(&written[2].path));
    assert_eq!(
        &table.header[..6],
        &["onset", "duration", "sample", "trial", "eventIdentifier", "STIM_ON"]
    );
    assert_eq!(table.header.last().map(String::as_str), Some("correct"));
    assert_eq!(table.rows.len(), 2);

    let first = &table.rows[0];
    assert_eq!(table.cell(first, "trial"), Some("1"));
    assert_eq!(table.cell(first, "eventIdentifier"), Some("TRIALID 1"));
    assert_eq!(table.cell(first, "STIM_ON"), Some("1005"));
    assert_eq!(table.cell(first, "SFIX"), Some("1002"));
    assert_eq!(table.cell(first, "SBLINK"), None);
    assert_eq!(table.cell(first, "response"), Some("left"));

    let second = &table.rows[1];
    assert_eq!(table.cell(second, "response"), Some("right"));
    assert_eq!(table.cell(second, "correct"), Some("0"));
}

#[test]
fn uncompressed_output_without_source_copy() {
    let out = TempDir::new().unwrap();
    let writer = BidsWriter::new(out.path())
        .compress_samples(false)
        .copy_source(false);
    let written = job().run(&converter(), &writer).unwrap();
    assert_eq!(written.len(), 3);
    assert!(read(&written[1].path).starts_with("time\txpl\typl\tpsl\n1000\t512.0\t384.0\t900.0\n"));
}

#[test]
fn unknown_start_message_writes_nothing() {
    let out = TempDir::new().unwrap();
    let converter = Converter::new(ParseOptions::new("NO_SUCH_MARKER").unwrap());
    let err = job()
        .run(&converter, &BidsWriter::new(out.path()))
        .unwrap_err();
    assert!(format!("{:#}", err).contains("NO_SUCH_MARKER"));
    assert!(!out.path().join("sub-01").exists());
}
