//! Tab-separated tables.
//!
//! Reading accepts a header row followed by data rows. When the header has
//! no tab the table is read as space-separated with `"` quoting, the layout
//! older info tables were written in. Writing always uses tabs and `n/a` for
//! missing values.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use tracing::warn;

use crate::events::{format_float, EventTable, EventValue};
use crate::samples::SampleStream;

/// Cell text meaning "no value".
pub const NA: &str = "n/a";

/// True for the cell spellings that mean "no value".
pub fn is_absent(cell: &str) -> bool {
    matches!(cell.trim(), "" | "n/a" | "None")
}

/// A parsed table: header plus rows padded to the header width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TsvTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TsvTable {
    /// Read a table from a file.
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read table: {:?}", path))?;
        Ok(Self::parse_str(&content))
    }

    /// Parse table text. Blank lines are skipped.
    ///
    /// Tab-separated text is split on every tab with no quoting. Otherwise
    /// cells are separated by single spaces and a cell holding spaces is
    /// quoted (`"Institut de Neurosciences"`).
    pub fn parse_str(content: &str) -> Self {
        let header_line = content.lines().find(|l| !l.trim().is_empty());
        let Some(header_line) = header_line else {
            return Self::default();
        };
        let tabbed = header_line.contains('\t');

        let mut reader = ReaderBuilder::new()
            .delimiter(if tabbed { b'\t' } else { b' ' })
            .quoting(!tabbed)
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(content.as_bytes());

        let mut records = Vec::new();
        for (line, record) in reader.records().enumerate() {
            match record {
                Ok(record) => {
                    let cells: Vec<String> = record.iter().map(str::to_string).collect();
                    if cells.iter().any(|c| !c.is_empty()) {
                        records.push(cells);
                    }
                }
                Err(e) => warn!(record = line + 1, error = %e, "skipping unreadable table row"),
            }
        }

        let mut records = records.into_iter();
        let header = records.next().unwrap_or_default();
        let rows = records
            .map(|mut row| {
                row.resize(header.len().max(row.len()), String::new());
                row
            })
            .collect();

        Self { header, rows }
    }

    /// Position of a column.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Cell of a row by column name, `None` for absent values.
    pub fn cell<'t>(&'t self, row: &'t [String], name: &str) -> Option<&'t str> {
        let value = row.get(self.column(name)?)?;
        (!is_absent(value)).then_some(value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as event merge patches.
    pub fn event_rows(&self) -> Vec<Vec<(String, EventValue)>> {
        self.rows
            .iter()
            .map(|row| {
                self.header
                    .iter()
                    .zip(row)
                    .map(|(name, cell)| (name.clone(), EventValue::from_cell(cell)))
                    .collect()
            })
            .collect()
    }

    /// Write the table with tabs, absent cells as `n/a`.
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_row(writer, self.header.iter())?;
        for row in &self.rows {
            write_row(
                writer,
                row.iter()
                    .map(|cell| if is_absent(cell) { NA } else { cell.as_str() }),
            )?;
        }
        Ok(())
    }
}

/// Write one tab-separated line.
pub fn write_row<W, I, S>(writer: &mut W, cells: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let line: Vec<S> = cells.into_iter().collect();
    let line: Vec<&str> = line.iter().map(AsRef::as_ref).collect();
    writeln!(writer, "{}", line.join("\t"))
}

/// Write a sample stream: header of column names, one row per record.
pub fn write_samples<W: Write>(writer: &mut W, stream: &SampleStream) -> io::Result<()> {
    let names = stream
        .schema
        .as_ref()
        .map_or_else(|| vec!["time"], |schema| schema.names());
    write_row(writer, names)?;

    for record in &stream.records {
        let mut cells = Vec::with_capacity(record.values.len() + 1);
        cells.push(record.time.to_string());
        cells.extend(
            record
                .values
                .iter()
                .map(|v| v.map_or_else(|| NA.to_string(), format_float)),
        );
        write_row(writer, cells)?;
    }
    Ok(())
}

/// Write an event table: the union of columns, `n/a` where a record has no
/// value.
pub fn write_events<W: Write>(writer: &mut W, events: &EventTable) -> io::Result<()> {
    let columns = events.columns();
    write_row(writer, &columns)?;

    for event in events {
        let cells = columns.iter().map(|name| {
            event
                .get(name)
                .unwrap_or(EventValue::Null)
                .to_string()
        });
        write_row(writer, cells)?;
    }
    Ok(())
}
