//! Gaze sample stream extraction.
//!
//! The `SAMPLES` line of an ASC log announces which columns the following
//! numeric rows carry. The schema is inferred from the first such line and
//! then applied positionally to every sample row.
//!
//! | Recording                        | Columns                                   |
//! |----------------------------------|-------------------------------------------|
//! | Monocular (left)                 | `time xpl ypl psl`                        |
//! | Monocular (right) + velocity     | `time xpr ypr psr xvr yvr`                |
//! | Binocular + resolution           | `time xpl ypl psl xpr ypr psr xr yr`      |
//! | Binocular + velocity + resolution| `time xpl ypl psl xpr ypr psr xvl yvl xvr yvr xr yr` |

use tracing::debug;

use crate::asc::LineKind;
use crate::asc::AscLog;

/// One column of the sample stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleField {
    /// Device timestamp in milliseconds
    Time,
    /// Left eye X position
    Xpl,
    /// Left eye Y position
    Ypl,
    /// Left pupil size (area or diameter)
    Psl,
    /// Right eye X position
    Xpr,
    /// Right eye Y position
    Ypr,
    /// Right pupil size
    Psr,
    /// Left eye X velocity (degrees/sec)
    Xvl,
    /// Left eye Y velocity
    Yvl,
    /// Right eye X velocity
    Xvr,
    /// Right eye Y velocity
    Yvr,
    /// X resolution (position units/degree)
    Xr,
    /// Y resolution
    Yr,
}

impl SampleField {
    pub fn name(&self) -> &'static str {
        match self {
            SampleField::Time => "time",
            SampleField::Xpl => "xpl",
            SampleField::Ypl => "ypl",
            SampleField::Psl => "psl",
            SampleField::Xpr => "xpr",
            SampleField::Ypr => "ypr",
            SampleField::Psr => "psr",
            SampleField::Xvl => "xvl",
            SampleField::Yvl => "yvl",
            SampleField::Xvr => "xvr",
            SampleField::Yvr => "yvr",
            SampleField::Xr => "xr",
            SampleField::Yr => "yr",
        }
    }
}

/// Ordered column layout of a sample stream. Always starts with `time`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSchema {
    fields: Vec<SampleField>,
}

impl SampleSchema {
    /// Infer the layout from a `SAMPLES` header line.
    ///
    /// Tokens are matched exactly on the tab-separated fields: `LEFT`,
    /// `RIGHT`, `VEL` and `RES`.
    pub fn from_header(header: &str) -> Self {
        let tokens: Vec<&str> = header.split('\t').map(str::trim).collect();
        let has = |token: &str| tokens.iter().any(|t| *t == token);
        let (left, right) = (has("LEFT"), has("RIGHT"));

        let mut fields = vec![SampleField::Time];
        if left {
            fields.extend([SampleField::Xpl, SampleField::Ypl, SampleField::Psl]);
        }
        if right {
            fields.extend([SampleField::Xpr, SampleField::Ypr, SampleField::Psr]);
        }
        if has("VEL") {
            if left {
                fields.extend([SampleField::Xvl, SampleField::Yvl]);
            }
            if right {
                fields.extend([SampleField::Xvr, SampleField::Yvr]);
            }
        }
        if has("RES") {
            fields.extend([SampleField::Xr, SampleField::Yr]);
        }

        Self { fields }
    }

    pub fn fields(&self) -> &[SampleField] {
        &self.fields
    }

    /// Column names, `time` first.
    pub fn names(&self) -> Vec<&'static str> {
        self.fields.iter().map(SampleField::name).collect()
    }

    /// Number of columns including `time`.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Decode one sample row against this schema.
    ///
    /// Returns `None` only if the row has no integer timestamp. Every other
    /// column degrades to `None` when its token is missing or not a number
    /// (EyeLink writes `.` for lost tracking).
    pub fn decode(&self, row: &str) -> Option<SampleRecord> {
        let mut tokens = row.split('\t').map(str::trim);
        let time = tokens.next()?.parse::<i64>().ok()?;

        let values = (1..self.len())
            .map(|_| tokens.next().and_then(|t| t.parse::<f64>().ok()))
            .collect();

        Some(SampleRecord { time, values })
    }
}

/// One decoded sample row.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    /// Device timestamp
    pub time: i64,
    /// One value per non-time schema column
    pub values: Vec<Option<f64>>,
}

impl SampleRecord {
    /// Value of a column, `None` for `time` or unknown columns.
    pub fn get(&self, schema: &SampleSchema, field: SampleField) -> Option<f64> {
        let index = schema.fields().iter().position(|f| *f == field)?;
        self.values.get(index.checked_sub(1)?).copied().flatten()
    }
}

/// The gaze stream of one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleStream {
    /// `None` when the log has no `SAMPLES` line
    pub schema: Option<SampleSchema>,
    pub records: Vec<SampleRecord>,
}

impl SampleStream {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Extracts the [`SampleStream`] of a log.
#[derive(Debug, Default, Clone, Copy)]
pub struct SampleStreamExtractor;

impl SampleStreamExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Decode every sample row that follows the first `SAMPLES` line.
    ///
    /// Rows seen before the schema is known are skipped. Later `SAMPLES`
    /// lines do not change the schema.
    pub fn extract(&self, log: &AscLog) -> SampleStream {
        let mut stream = SampleStream::default();
        let mut skipped = 0usize;

        for (kind, l) in log.classified() {
            match kind {
                LineKind::SamplesHeader if stream.schema.is_none() => {
                    let schema = SampleSchema::from_header(l);
                    debug!(columns = ?schema.names(), "inferred sample schema");
                    stream.schema = Some(schema);
                }
                LineKind::Sample => match &stream.schema {
                    Some(schema) => {
                        if let Some(record) = schema.decode(l) {
                            stream.records.push(record);
                        }
                    }
                    None => skipped += 1,
                },
                _ => {}
            }
        }

        if skipped > 0 {
            debug!(skipped, "sample rows before the SAMPLES line were skipped");
        }
        debug!(
            samples = stream.len(),
            first = ?stream.records.first().map(|r| r.time),
            last = ?stream.records.last().map(|r| r.time),
            "decoded sample stream"
        );
        stream
    }
}
