//! Conversion of whole datasets.
//!
//! A [`FileJob`] carries everything one file needs: its source, its BIDS
//! entities and the overlays applied after extraction. [`Batch`] builds one
//! job per info table row and runs them on a rayon pool, one file per
//! worker. Results come back in table order.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::bids::{
    BidsEntities, BidsWriter, InfoRow, InfoTable, TsvTable, WrittenFile, DEFAULT_INFO_FILE,
};
use crate::convert::{Converter, Recording};
use crate::settings::Settings;

/// File name of the settings template written next to the data.
pub const SETTINGS_TEMPLATE: &str = "settings.json";

/// Conversion of one file with its overlays.
#[derive(Debug, Clone)]
pub struct FileJob {
    pub source: PathBuf,
    pub entities: BidsEntities,
    /// Fills `TaskName` when neither the log nor an overlay did
    pub task_name: Option<String>,
    /// Settings JSON applied after extraction
    pub json_overrides: Option<Map<String, Value>>,
    /// Per-file text cells applied after the JSON overrides
    pub text_overrides: Vec<(String, String)>,
    /// Events table merged by trial number
    pub events: Option<PathBuf>,
}

impl FileJob {
    pub fn new(source: impl Into<PathBuf>, entities: BidsEntities) -> Self {
        Self {
            source: source.into(),
            entities,
            task_name: None,
            json_overrides: None,
            text_overrides: Vec::new(),
            events: None,
        }
    }

    /// Convert the source and apply every overlay, without writing.
    pub fn prepare(&self, converter: &Converter) -> Result<Recording> {
        let mut recording = converter.convert_path(&self.source)?;
        let settings = &mut recording.settings;

        if let Some(overrides) = &self.json_overrides {
            settings.overlay(overrides)?;
        }
        for (key, text) in &self.text_overrides {
            settings
                .set_from_text(key, text)
                .with_context(|| format!("In info table row for {:?}", self.source))?;
        }
        if settings.task_name.is_none() {
            settings.task_name = self.task_name.clone();
        }

        if let Some(events) = &self.events {
            let table = TsvTable::read(events)?;
            recording.events.merge(table.event_rows());
        }

        recording.check_required();
        Ok(recording)
    }

    /// Convert and write.
    pub fn run(&self, converter: &Converter, writer: &BidsWriter) -> Result<Vec<WrittenFile>> {
        let recording = self.prepare(converter)?;
        writer.write(&self.entities, &recording, Some(&self.source))
    }
}

/// Result of one file of a batch.
#[derive(Debug)]
pub struct FileOutcome {
    pub filename: String,
    pub result: Result<Vec<WrittenFile>>,
}

/// Results of a batch, in info table order.
#[derive(Debug)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
    pub participants: WrittenFile,
}

impl BatchReport {
    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Every file of an info table.
#[derive(Debug, Clone)]
pub struct Batch {
    input_dir: PathBuf,
    info: InfoTable,
    json_overrides: Option<Map<String, Value>>,
    workers: usize,
}

impl Batch {
    pub fn new(input_dir: impl Into<PathBuf>, info: InfoTable, workers: usize) -> Self {
        Self {
            input_dir: input_dir.into(),
            info,
            json_overrides: None,
            workers: workers.max(1),
        }
    }

    /// Settings JSON applied to every file.
    pub fn with_settings(mut self, overrides: Option<Map<String, Value>>) -> Self {
        self.json_overrides = overrides;
        self
    }

    /// Job of one info table row.
    pub fn job(&self, row: &InfoRow) -> Result<FileJob> {
        let entities = row
            .entities()
            .with_context(|| format!("Invalid entities for {}", row.filename))?;
        let mut job = FileJob::new(self.input_dir.join(row.relative_path()), entities);
        job.task_name = row.task.clone();
        job.json_overrides = self.json_overrides.clone();
        job.text_overrides = self.info.file_settings(row);
        job.events = row.events_path().map(|events| self.input_dir.join(events));
        Ok(job)
    }

    /// Convert every file, then write the participants table.
    ///
    /// A failing file is reported in its outcome and does not stop the
    /// others. Only failing to write the participants table is an error.
    pub fn run(&self, converter: &Converter, writer: &BidsWriter) -> Result<BatchReport> {
        let convert_row = |row: &InfoRow| {
            let result = self.job(row).and_then(|job| job.run(converter, writer));
            match &result {
                Ok(files) => info!(file = %row.filename, written = files.len(), "converted"),
                Err(e) => {
                    warn!(file = %row.filename, error = %format!("{:#}", e), "conversion failed")
                }
            }
            FileOutcome {
                filename: row.filename.clone(),
                result,
            }
        };

        let rows = self.info.rows();
        let outcomes: Vec<FileOutcome> = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("ascbids-{}", i))
            .build()
        {
            Ok(pool) => pool.install(|| rows.par_iter().map(convert_row).collect()),
            Err(e) => {
                warn!(error = %e, "failed to create worker pool, converting sequentially");
                rows.iter().map(convert_row).collect()
            }
        };

        let participants = writer.write_participants(&self.info)?;
        Ok(BatchReport {
            outcomes,
            participants,
        })
    }
}

/// Load the info table of a directory and check that it lists every data
/// file there. Without a name the table is discovered.
pub fn load_info(
    input_dir: &Path,
    info_file: Option<&str>,
    output: Option<&Path>,
) -> Result<InfoTable> {
    let path = match info_file {
        Some(name) => input_dir.join(name),
        None => {
            let path = InfoTable::discover(input_dir)?;
            info!(path = %path.display(), "using discovered info table");
            path
        }
    };
    let info = InfoTable::load(&path)?;
    info.check_listed(input_dir, output)?;
    Ok(info)
}

/// Write a starter info table and a settings template into `dir`.
///
/// Existing files are kept unless `force` is set. Returns the written paths.
pub fn write_starter_files(dir: &Path, force: bool) -> Result<Vec<PathBuf>> {
    let info_path = dir.join(DEFAULT_INFO_FILE);
    let settings_path = dir.join(SETTINGS_TEMPLATE);
    if !force {
        if let Some(existing) = [&info_path, &settings_path].into_iter().find(|p| p.exists()) {
            anyhow::bail!("{:?} already exists. Use --force to overwrite.", existing);
        }
    }

    let table = InfoTable::starter(dir)?;
    if table.is_empty() {
        warn!(dir = %dir.display(), "no data files found, starter table has no rows");
    }
    let mut text = Vec::new();
    table.write(&mut text)?;
    fs::write(&info_path, text)
        .with_context(|| format!("Failed to write info table: {:?}", info_path))?;

    let template = Settings::new().to_json_pretty()?;
    fs::write(&settings_path, template + "\n")
        .with_context(|| format!("Failed to write settings template: {:?}", settings_path))?;

    info!(rows = table.rows.len(), path = %info_path.display(), "wrote starter info table");
    Ok(vec![info_path, settings_path])
}
