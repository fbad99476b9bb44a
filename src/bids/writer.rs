//! Writes a [`Recording`] as BIDS eye-tracking files.

use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::debug;

use super::entities::BidsEntities;
use super::info::InfoTable;
use super::tsv;
use crate::convert::Recording;

/// A file produced by the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub bytes: u64,
}

impl WrittenFile {
    fn stat(path: PathBuf) -> Result<Self> {
        let bytes = fs::metadata(&path)
            .with_context(|| format!("Failed to stat {:?}", path))?
            .len();
        Ok(Self { path, bytes })
    }
}

impl fmt::Display for WrittenFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({})",
            self.path.display(),
            humansize::format_size(self.bytes, humansize::BINARY)
        )
    }
}

/// Output layout options.
#[derive(Debug, Clone)]
pub struct BidsWriter {
    root: PathBuf,
    compress_samples: bool,
    copy_source: bool,
}

impl BidsWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            compress_samples: true,
            copy_source: true,
        }
    }

    /// Write `_eyetrack.tsv.gz` (default) or a plain `_eyetrack.tsv`.
    pub fn compress_samples(mut self, compress: bool) -> Self {
        self.compress_samples = compress;
        self
    }

    /// Copy the source log next to the outputs as `_eyetrack.asc`.
    pub fn copy_source(mut self, copy: bool) -> Self {
        self.copy_source = copy;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write every file of one recording.
    ///
    /// Returns the written files in order: sidecar, samples, events and the
    /// source copy when enabled.
    pub fn write(
        &self,
        entities: &BidsEntities,
        recording: &Recording,
        source: Option<&Path>,
    ) -> Result<Vec<WrittenFile>> {
        let dir = entities.directory(&self.root);
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create directory: {:?}", dir))?;
        let stem = entities.file_stem();

        let mut written = Vec::new();

        let sidecar = dir.join(format!("{}_eyetrack.json", stem));
        let json = recording
            .settings
            .to_json_pretty()
            .context("Failed to serialize settings")?;
        fs::write(&sidecar, json + "\n").with_context(|| format!("Failed to write {:?}", sidecar))?;
        written.push(WrittenFile::stat(sidecar)?);

        let samples = if self.compress_samples {
            dir.join(format!("{}_eyetrack.tsv.gz", stem))
        } else {
            dir.join(format!("{}_eyetrack.tsv", stem))
        };
        self.write_samples(&samples, recording)?;
        written.push(WrittenFile::stat(samples)?);

        let events = dir.join(format!("{}_events.tsv", stem));
        let mut out = create(&events)?;
        tsv::write_events(&mut out, &recording.events)
            .and_then(|_| out.flush())
            .with_context(|| format!("Failed to write {:?}", events))?;
        written.push(WrittenFile::stat(events)?);

        if let Some(source) = source.filter(|_| self.copy_source) {
            let copy = dir.join(format!("{}_eyetrack.asc", stem));
            fs::copy(source, &copy)
                .with_context(|| format!("Failed to copy {:?} to {:?}", source, copy))?;
            written.push(WrittenFile::stat(copy)?);
        }

        debug!(directory = ?dir, files = written.len(), "wrote recording");
        Ok(written)
    }

    fn write_samples(&self, path: &Path, recording: &Recording) -> Result<()> {
        let out = create(path)?;
        let context = || format!("Failed to write {:?}", path);

        if self.compress_samples {
            let mut encoder = GzEncoder::new(out, Compression::default());
            tsv::write_samples(&mut encoder, &recording.samples).with_context(context)?;
            encoder.finish().and_then(|mut inner| inner.flush()).with_context(context)?;
        } else {
            let mut out = out;
            tsv::write_samples(&mut out, &recording.samples)
                .and_then(|_| out.flush())
                .with_context(context)?;
        }
        Ok(())
    }

    /// Write the participants table of an info table at the output root.
    pub fn write_participants(&self, info: &InfoTable) -> Result<WrittenFile> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create directory: {:?}", self.root))?;
        let path = self.root.join(info.participants_filename());
        let mut out = create(&path)?;
        info.participants_table()
            .write(&mut out)
            .and_then(|_| out.flush())
            .with_context(|| format!("Failed to write {:?}", path))?;
        WrittenFile::stat(path)
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    Ok(BufWriter::new(file))
}
