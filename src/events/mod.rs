//! Trial event table.
//!
//! One [`TrialEvent`] per trial: timing relative to the first trial plus
//! one captured value per watched event name. [`EventTable`] keeps the
//! trials in order and indexes them by trial number for merging and
//! lookups.
//!
//! # Structure
//!
//! - `extract` - Trial segmentation state machine over an ASC log

mod extract;

pub use extract::{watch_list, TrialEventExtractor, MANDATORY_EVENTS};

use std::collections::HashMap;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::warn;

use crate::error::Error;

// ============================================================================
// Values
// ============================================================================

/// Value of one event column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<EventValue>),
}

impl EventValue {
    /// Collapse captured values: nothing captured is `Null`, exactly one
    /// value becomes that scalar, anything else stays a list (including an
    /// empty one).
    pub fn collapse(captured: Option<Vec<EventValue>>) -> Self {
        match captured {
            None => EventValue::Null,
            Some(mut values) if values.len() == 1 => values.remove(0),
            Some(values) => EventValue::List(values),
        }
    }

    /// Decode a table cell. `n/a` and empty cells are `Null`.
    pub fn from_cell(cell: &str) -> Self {
        match cell.trim() {
            "" | "n/a" => EventValue::Null,
            text => EventValue::Text(text.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, EventValue::Null)
    }

    /// Numeric view of the value, decoding text when needed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            EventValue::Integer(i) => Some(*i as f64),
            EventValue::Float(f) => Some(*f),
            EventValue::Text(t) => t.trim().parse().ok(),
            _ => None,
        }
    }

    /// Integer view of the value, accepting integral floats.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            EventValue::Integer(i) => Some(*i),
            EventValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            EventValue::Text(t) => {
                let t = t.trim();
                t.parse::<i64>().ok().or_else(|| {
                    t.parse::<f64>()
                        .ok()
                        .filter(|f| f.fract() == 0.0)
                        .map(|f| f as i64)
                })
            }
            _ => None,
        }
    }
}

impl fmt::Display for EventValue {
    /// Table cell rendering: `n/a` for null, `[a, b]` for lists.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventValue::Null => write!(f, "n/a"),
            EventValue::Integer(i) => write!(f, "{}", i),
            EventValue::Float(x) => write!(f, "{}", format_float(*x)),
            EventValue::Text(t) => write!(f, "{}", t),
            EventValue::List(values) => {
                write!(f, "[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Floats keep a decimal point so integral values read as floats.
pub fn format_float(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 {
        format!("{:.1}", x)
    } else {
        format!("{}", x)
    }
}

// ============================================================================
// Trial Events
// ============================================================================

/// One row of the events table.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialEvent {
    /// Seconds since the start of the first trial
    pub onset: Option<f64>,
    /// Seconds
    pub duration: Option<f64>,
    /// Device timestamp of the trial start
    pub sample: Option<i64>,
    /// Trial number, dense from 1 for extracted tables
    pub trial: u32,
    /// Start message text
    pub event_identifier: Option<String>,
    /// Watched events in watch-list order
    pub fields: Vec<(String, EventValue)>,
}

impl TrialEvent {
    /// Empty record for a trial number.
    pub fn new(trial: u32) -> Self {
        Self {
            onset: None,
            duration: None,
            sample: None,
            trial,
            event_identifier: None,
            fields: Vec::new(),
        }
    }

    /// Value of a column by name, mandatory columns included.
    pub fn get(&self, name: &str) -> Option<EventValue> {
        match name {
            "onset" => Some(self.onset.map_or(EventValue::Null, EventValue::Float)),
            "duration" => Some(self.duration.map_or(EventValue::Null, EventValue::Float)),
            "sample" => Some(self.sample.map_or(EventValue::Null, EventValue::Integer)),
            "trial" => Some(EventValue::Integer(i64::from(self.trial))),
            "eventIdentifier" => Some(
                self.event_identifier
                    .clone()
                    .map_or(EventValue::Null, EventValue::Text),
            ),
            _ => self
                .fields
                .iter()
                .find(|(field, _)| field == name)
                .map(|(_, value)| value.clone()),
        }
    }

    /// Set a column by name (last write wins).
    ///
    /// Mandatory columns are decoded into their numeric types; a value that
    /// does not decode is dropped with a warning.
    pub fn set(&mut self, name: &str, value: EventValue) {
        match name {
            "onset" => self.onset = decode_mandatory(name, &value, EventValue::as_f64),
            "duration" => self.duration = decode_mandatory(name, &value, EventValue::as_f64),
            "sample" => self.sample = decode_mandatory(name, &value, EventValue::as_i64),
            "trial" => {
                match value.as_i64().and_then(|t| u32::try_from(t).ok()) {
                    Some(trial) => self.trial = trial,
                    None => warn!(value = %value, "ignoring undecodable trial number"),
                }
            }
            "eventIdentifier" => {
                self.event_identifier = match value {
                    EventValue::Null => None,
                    other => Some(other.to_string()),
                }
            }
            _ => match self.fields.iter_mut().find(|(field, _)| field == name) {
                Some((_, slot)) => *slot = value,
                None => self.fields.push((name.to_string(), value)),
            },
        }
    }

    /// Column names of this record, mandatory columns first.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        MANDATORY_EVENTS
            .iter()
            .copied()
            .chain(self.fields.iter().map(|(name, _)| name.as_str()))
    }

    /// Populated columns as a merge patch.
    ///
    /// Mandatory columns are included only when known; watched columns are
    /// always included.
    pub fn to_patch(&self) -> Vec<(String, EventValue)> {
        self.columns()
            .filter_map(|name| {
                let value = self.get(name)?;
                let keep = !MANDATORY_EVENTS.contains(&name) || !value.is_null();
                keep.then(|| (name.to_string(), value))
            })
            .collect()
    }
}

fn decode_mandatory<T>(
    name: &str,
    value: &EventValue,
    decode: impl Fn(&EventValue) -> Option<T>,
) -> Option<T> {
    if value.is_null() {
        return None;
    }
    let decoded = decode(value);
    if decoded.is_none() {
        warn!(column = name, value = %value, "dropping undecodable event value");
    }
    decoded
}

impl Serialize for TrialEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(MANDATORY_EVENTS.len() + self.fields.len()))?;
        for name in self.columns() {
            map.serialize_entry(name, &self.get(name).unwrap_or(EventValue::Null))?;
        }
        map.end()
    }
}

// ============================================================================
// Event Table
// ============================================================================

/// Ordered trial records indexed by trial number.
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    events: Vec<TrialEvent>,
    index: HashMap<u32, usize>,
}

impl PartialEq for EventTable {
    fn eq(&self, other: &Self) -> bool {
        self.events == other.events
    }
}

impl EventTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from records. A repeated trial number keeps its first
    /// position; later records with that number are merged into it.
    pub fn from_events(events: Vec<TrialEvent>) -> Self {
        let mut table = Self::new();
        for event in events {
            table.upsert(event.trial, event.to_patch());
        }
        table
    }

    /// Append a record (or merge it when its trial number is already known).
    pub fn push(&mut self, event: TrialEvent) {
        if self.index.contains_key(&event.trial) {
            self.upsert(event.trial, event.to_patch());
        } else {
            self.index.insert(event.trial, self.events.len());
            self.events.push(event);
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrialEvent> {
        self.events.iter()
    }

    pub fn events(&self) -> &[TrialEvent] {
        &self.events
    }

    /// Record of a trial number.
    pub fn get(&self, trial: u32) -> Option<&TrialEvent> {
        self.index.get(&trial).map(|&i| &self.events[i])
    }

    /// Record of a trial number, as a lookup error when absent.
    pub fn get_or_err(&self, trial: u32) -> Result<&TrialEvent, Error> {
        self.get(trial).ok_or(Error::UnknownTrial { trial })
    }

    /// Union of the columns of every record, in first-appearance order.
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = MANDATORY_EVENTS.iter().map(|c| c.to_string()).collect();
        for event in &self.events {
            for (name, _) in &event.fields {
                if !columns.contains(name) {
                    columns.push(name.clone());
                }
            }
        }
        columns
    }

    /// Merge rows from another source, joined on trial number.
    ///
    /// A row without a `trial` column takes its 1-based position in `rows`.
    /// Rows of a known trial overwrite its fields; other rows are appended.
    /// Applying the same rows twice gives the same table.
    pub fn merge<I>(&mut self, rows: I)
    where
        I: IntoIterator<Item = Vec<(String, EventValue)>>,
    {
        for (position, row) in rows.into_iter().enumerate() {
            let trial = row
                .iter()
                .find(|(name, _)| name == "trial")
                .and_then(|(_, value)| value.as_i64())
                .and_then(|t| u32::try_from(t).ok())
                .unwrap_or(position as u32 + 1);
            self.upsert(trial, row);
        }
    }

    /// Merge another table into this one (incoming values win).
    pub fn merge_table(&mut self, other: &EventTable) {
        self.merge(other.iter().map(TrialEvent::to_patch));
    }

    fn upsert(&mut self, trial: u32, patch: Vec<(String, EventValue)>) {
        let index = match self.index.get(&trial) {
            Some(&index) => index,
            None => {
                self.index.insert(trial, self.events.len());
                self.events.push(TrialEvent::new(trial));
                self.events.len() - 1
            }
        };

        let event = &mut self.events[index];
        for (name, value) in patch {
            if name != "trial" {
                event.set(&name, value);
            }
        }
    }
}

impl Serialize for EventTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.events.serialize(serializer)
    }
}

impl<'a> IntoIterator for &'a EventTable {
    type Item = &'a TrialEvent;
    type IntoIter = std::slice::Iter<'a, TrialEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
