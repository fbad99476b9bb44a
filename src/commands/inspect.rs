//! Inspect command handler

use anyhow::{Context, Result};
use serde_json::json;
use std::fs;
use std::path::PathBuf;

use ascbids::cli::ParseArgs;
use ascbids::events::format_float;
use ascbids::{AscLog, Config, EventTable, EventValue, Recording};

/// Print what a log contains.
#[cfg(not(tarpaulin_include))]
pub fn handle(
    config: &Config,
    input: PathBuf,
    trials: bool,
    json: bool,
    parse: &ParseArgs,
) -> Result<()> {
    let converter = super::converter(config, parse)?;
    let log = AscLog::parse(&input)?;
    let recording = converter
        .convert(&log)
        .with_context(|| format!("Failed to convert {:?}", input))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&to_json(&recording))?);
        return Ok(());
    }

    let size = fs::metadata(&input).map(|m| m.len()).unwrap_or(0);
    println!(
        "{} ({}, {} lines)",
        input.display(),
        humansize::format_size(size, humansize::BINARY),
        log.len()
    );
    print!("{}", summary(&recording));
    if trials {
        print!("{}", trial_lines(&recording.events));
    }
    Ok(())
}

fn or_na(value: Option<String>) -> String {
    value.unwrap_or_else(|| "n/a".to_string())
}

/// Settings, schema and trial counts.
pub fn summary(recording: &Recording) -> String {
    let settings = &recording.settings;
    let mut out = String::new();

    out.push_str(&format!(
        "Sampling frequency: {}\n",
        or_na(settings.sampling_frequency.map(format_float))
    ));
    out.push_str(&format!("Recorded eye:       {}\n", or_na(settings.recorded_eye.clone())));
    out.push_str(&format!(
        "Device:             {}\n",
        or_na(settings.manufacturers_model_name.clone())
    ));

    let columns = recording
        .samples
        .schema
        .as_ref()
        .map(|schema| schema.names().join(" "));
    out.push_str(&format!("Sample columns:     {}\n", or_na(columns)));
    out.push_str(&format!("Samples:            {}\n", recording.samples.len()));
    out.push_str(&format!("Trials:             {}\n", recording.events.len()));

    let missing = settings.missing_required();
    if !missing.is_empty() {
        out.push_str(&format!("Missing settings:   {}\n", missing.join(", ")));
    }
    out
}

/// One line per trial: number, onset, duration and identifier.
pub fn trial_lines(events: &EventTable) -> String {
    let mut out = String::new();
    for event in events {
        let cell = |name: &str| event.get(name).unwrap_or(EventValue::Null).to_string();
        out.push_str(&format!(
            "{:>5}  {:>10}  {:>8}  {}\n",
            event.trial,
            cell("onset"),
            cell("duration"),
            cell("eventIdentifier")
        ));
    }
    out
}

/// Settings and trials as one JSON document.
pub fn to_json(recording: &Recording) -> serde_json::Value {
    json!({
        "settings": recording.settings,
        "samples": recording.samples.len(),
        "events": recording.events,
    })
}
