//! Info table describing the files of a dataset.
//!
//! One row per data file. The entity columns name the BIDS output; every
//! other column is either a participant column (constant across all files
//! of each participant, written to the participants table) or a file column
//! (applied to that file's settings when it names a sidecar key).

use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use super::entities::{sanitize_label, BidsEntities};
use super::tsv::TsvTable;
use crate::error::Error;

/// Default name of the info table inside the input directory.
pub const DEFAULT_INFO_FILE: &str = "infoFiles.tsv";

/// Extension of the data files a dataset must list.
pub const DATA_EXTENSION: &str = "asc";

/// Columns every info table must have.
pub const REQUIRED_COLUMNS: [&str; 3] = ["filename", "filepath", "participant_id"];

/// Columns that describe a file rather than a participant or a setting.
const FILE_ENTITY_COLUMNS: [&str; 7] = [
    "filename",
    "filepath",
    "eventsfilename",
    "ses",
    "task",
    "acq",
    "run",
];

/// Columns of a starter table, in the order they are written.
pub const STARTER_COLUMNS: [&str; 8] = [
    "filename",
    "filepath",
    "eventsfilename",
    "participant_id",
    "ses",
    "task",
    "acq",
    "run",
];

/// One file entry of the info table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoRow {
    pub filename: String,
    /// Directory of the file, relative to the input directory (empty for
    /// files at its root)
    pub filepath: String,
    pub participant_id: String,
    pub session: Option<String>,
    pub task: Option<String>,
    pub acquisition: Option<String>,
    pub run: Option<String>,
    /// Events table to merge, relative to the directory of the data file
    pub events_filename: Option<String>,
    /// Remaining non-absent cells by column name
    pub extra: Vec<(String, String)>,
}

impl InfoRow {
    /// BIDS entities of this file.
    pub fn entities(&self) -> Result<BidsEntities, Error> {
        Ok(BidsEntities::new(&self.participant_id)?
            .with_session(self.session.as_deref())
            .with_task(self.task.as_deref())
            .with_acquisition(self.acquisition.as_deref())
            .with_run(self.run.as_deref()))
    }

    /// Path of the data file, relative to the input directory.
    pub fn relative_path(&self) -> PathBuf {
        normalize(&Path::new(&self.filepath).join(&self.filename))
    }

    /// Path of the events table, relative to the input directory.
    pub fn events_path(&self) -> Option<PathBuf> {
        let events = self.events_filename.as_ref()?;
        Some(normalize(&Path::new(&self.filepath).join(events)))
    }

    fn extra(&self, column: &str) -> Option<&str> {
        self.extra
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }
}

/// Parsed info table with its column classification.
#[derive(Debug, Clone)]
pub struct InfoTable {
    path: PathBuf,
    rows: Vec<InfoRow>,
    participant_columns: Vec<String>,
    file_columns: Vec<String>,
}

impl InfoTable {
    /// Read and validate an info table.
    pub fn load(path: &Path) -> Result<Self> {
        let table = TsvTable::read(path)?;
        Ok(Self::from_table(path, &table)?)
    }

    /// Find the info table of a directory: the first `.tsv` file directly
    /// inside it, by name, whose header has a `filename` column.
    pub fn discover(dir: &Path) -> Result<PathBuf> {
        let entries =
            fs::read_dir(dir).with_context(|| format!("Failed to read directory: {:?}", dir))?;
        let mut candidates = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "tsv") {
                candidates.push(path);
            }
        }
        candidates.sort();

        for path in candidates {
            let table = TsvTable::read(&path)?;
            if table.column("filename").is_some() {
                debug!(table = ?path, "discovered info table");
                return Ok(path);
            }
        }
        anyhow::bail!(
            "No info table in {:?}: no .tsv file there has a filename column",
            dir
        )
    }

    /// Starter table listing every data file under `dir`.
    ///
    /// `eventsfilename` is filled when a `.tsv` with the same stem sits next
    /// to the data file. Participant and entity cells are left empty for the
    /// user to fill in.
    pub fn starter(dir: &Path) -> Result<TsvTable> {
        let mut found = Vec::new();
        collect_data_files(dir, dir, None, &mut found)?;

        let mut rows = Vec::with_capacity(found.len());
        for relative in found {
            let filename = relative
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let filepath = relative
                .parent()
                .map(|parent| parent.to_string_lossy().into_owned())
                .unwrap_or_default();
            let events = relative.with_extension("tsv");
            let events_filename = if dir.join(&events).is_file() {
                events
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default()
            } else {
                String::new()
            };

            let mut cells = vec![filename, filepath, events_filename];
            cells.resize(STARTER_COLUMNS.len(), String::new());
            rows.push(cells);
        }

        Ok(TsvTable {
            header: STARTER_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows,
        })
    }

    /// Validate a parsed table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInfoTable`] when a required column is
    /// missing, a row lacks a required value, or there are no rows.
    pub fn from_table(path: &Path, table: &TsvTable) -> Result<Self, Error> {
        let invalid = |reason: String| Error::InvalidInfoTable {
            path: path.to_path_buf(),
            reason,
        };

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| table.column(c).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(invalid(format!("missing column(s) {}", missing.join(", "))));
        }
        if table.is_empty() {
            return Err(invalid("no file rows".to_string()));
        }

        let mut rows = Vec::with_capacity(table.rows.len());
        for (i, cells) in table.rows.iter().enumerate() {
            let required = |name: &str| {
                table
                    .cell(cells, name)
                    .map(str::to_string)
                    .ok_or_else(|| invalid(format!("row {} has no {}", i + 1, name)))
            };
            let optional = |name: &str| table.cell(cells, name).map(str::to_string);

            let extra = table
                .header
                .iter()
                .filter(|name| is_extra_column(name))
                .filter_map(|name| Some((name.clone(), table.cell(cells, name)?.to_string())))
                .collect();

            rows.push(InfoRow {
                filename: required("filename")?,
                filepath: optional("filepath").unwrap_or_default(),
                participant_id: required("participant_id")?,
                session: optional("ses"),
                task: optional("task"),
                acquisition: optional("acq"),
                run: optional("run"),
                events_filename: optional("eventsfilename"),
                extra,
            });
        }

        let candidates: Vec<String> = table
            .header
            .iter()
            .filter(|name| is_extra_column(name))
            .cloned()
            .collect();
        let (participant_columns, file_columns): (Vec<String>, Vec<String>) = candidates
            .into_iter()
            .partition(|column| constant_per_participant(&rows, column));

        debug!(
            rows = rows.len(),
            participant_columns = ?participant_columns,
            file_columns = ?file_columns,
            "loaded info table"
        );

        Ok(Self {
            path: path.to_path_buf(),
            rows,
            participant_columns,
            file_columns,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> &[InfoRow] {
        &self.rows
    }

    /// Columns written to the participants table (besides `participant_id`).
    pub fn participant_columns(&self) -> &[String] {
        &self.participant_columns
    }

    /// Columns applied per file.
    pub fn file_columns(&self) -> &[String] {
        &self.file_columns
    }

    /// Row of a data file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFile`] if no row has this filename.
    pub fn row(&self, filename: &str) -> Result<&InfoRow, Error> {
        self.rows
            .iter()
            .find(|row| row.filename == filename)
            .ok_or_else(|| Error::UnknownFile {
                filename: filename.to_string(),
                table: self.path.display().to_string(),
            })
    }

    /// Per-file cells of `row`, in column order.
    ///
    /// Only non-blank cells are returned. Columns that are not sidecar keys
    /// are ignored when the cells are applied to settings.
    pub fn file_settings(&self, row: &InfoRow) -> Vec<(String, String)> {
        self.file_columns
            .iter()
            .filter_map(|column| Some((column.clone(), row.extra(column)?.to_string())))
            .collect()
    }

    /// Task shared by every row, if there is exactly one.
    pub fn common_task(&self) -> Option<String> {
        let tasks: BTreeSet<Option<String>> = self
            .rows
            .iter()
            .map(|row| row.task.as_deref().map(sanitize_label))
            .collect();
        match tasks.into_iter().collect::<Vec<_>>().as_slice() {
            [Some(task)] if !task.is_empty() => Some(task.clone()),
            _ => None,
        }
    }

    /// `task-<task>_participants.tsv` when every row shares a task,
    /// `participants.tsv` otherwise.
    pub fn participants_filename(&self) -> String {
        match self.common_task() {
            Some(task) => format!("task-{}_participants.tsv", task),
            None => "participants.tsv".to_string(),
        }
    }

    /// One row per participant, in order of first appearance.
    pub fn participants_table(&self) -> TsvTable {
        let mut header = vec!["participant_id".to_string()];
        header.extend(self.participant_columns.iter().cloned());

        let mut seen = BTreeSet::new();
        let mut rows = Vec::new();
        for row in &self.rows {
            if !seen.insert(row.participant_id.as_str()) {
                continue;
            }
            let mut cells = vec![row.participant_id.clone()];
            cells.extend(
                self.participant_columns
                    .iter()
                    .map(|column| row.extra(column).unwrap_or_default().to_string()),
            );
            rows.push(cells);
        }

        TsvTable { header, rows }
    }

    /// Check that every data file under `dir` has a row.
    ///
    /// Files below `exclude` (typically an output directory nested in the
    /// input) are not considered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInfoTable`] naming the unlisted files.
    pub fn check_listed(&self, dir: &Path, exclude: Option<&Path>) -> Result<()> {
        let listed: BTreeSet<PathBuf> = self.rows.iter().map(InfoRow::relative_path).collect();

        let mut found = Vec::new();
        collect_data_files(dir, dir, exclude, &mut found)?;

        let unlisted: Vec<String> = found
            .into_iter()
            .filter(|path| !listed.contains(path))
            .map(|path| path.display().to_string())
            .collect();

        if unlisted.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidInfoTable {
                path: self.path.clone(),
                reason: format!("no entry for {}", unlisted.join(", ")),
            }
            .into())
        }
    }
}

fn is_extra_column(name: &str) -> bool {
    !FILE_ENTITY_COLUMNS.contains(&name) && name != "participant_id"
}

fn constant_per_participant(rows: &[InfoRow], column: &str) -> bool {
    let mut values: Vec<(&str, Option<&str>)> = Vec::new();
    for row in rows {
        let value = row.extra(column);
        match values.iter().find(|(participant, _)| *participant == row.participant_id) {
            Some((_, first)) if *first != value => return false,
            Some(_) => {}
            None => values.push((row.participant_id.as_str(), value)),
        }
    }
    true
}

fn collect_data_files(
    root: &Path,
    dir: &Path,
    exclude: Option<&Path>,
    found: &mut Vec<PathBuf>,
) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory: {:?}", dir))?;
    for entry in entries {
        let path = entry?.path();
        if exclude.is_some_and(|excluded| path.starts_with(excluded)) {
            continue;
        }
        if path.is_dir() {
            collect_data_files(root, &path, exclude, found)?;
        } else if path.extension().is_some_and(|ext| ext == DATA_EXTENSION) {
            if let Ok(relative) = path.strip_prefix(root) {
                found.push(normalize(relative));
            }
        }
    }
    found.sort();
    Ok(())
}

/// Drop `.` components so `./data/a.asc` and `data/a.asc` compare equal.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect()
}
