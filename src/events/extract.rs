//! Trial segmentation.
//!
//! A trial opens on a line containing the start message and closes on the
//! end message when one is configured, otherwise on the next start message.
//! The last line of the log closes whatever trial is still open. While a
//! trial is open every watched event name found in a line feeds that name's
//! accumulator; closing lines are never accumulated.

use tracing::debug;

use super::{EventTable, EventValue, TrialEvent};
use crate::asc::line;
use crate::asc::AscLog;
use crate::settings::Settings;

/// Columns every trial record carries, in table order.
pub const MANDATORY_EVENTS: [&str; 5] =
    ["onset", "duration", "sample", "trial", "eventIdentifier"];

/// Build the full watch-list: the mandatory names first (unless the caller
/// already listed them), then the user's names, then every eye-movement
/// token the settings pass found.
pub fn watch_list(saved_events: &[String], settings: Option<&Settings>) -> Vec<String> {
    let mut list: Vec<String> = saved_events.to_vec();
    for (position, name) in MANDATORY_EVENTS.iter().enumerate() {
        if !list.iter().any(|e| e == name) {
            list.insert(position.min(list.len()), name.to_string());
        }
    }
    if let Some(settings) = settings {
        for token in settings.eye_movement_tokens() {
            if !list.iter().any(|e| e == token) {
                list.push(token.to_string());
            }
        }
    }
    list
}

enum TrialState {
    WaitingStart,
    InTrial(TrialAccumulator),
}

/// Values collected for the open trial.
struct TrialAccumulator {
    t_start: i64,
    event_identifier: Option<String>,
    /// One slot per watched (non-mandatory) name
    captures: Vec<Option<Vec<EventValue>>>,
}

impl TrialAccumulator {
    fn accumulate(&mut self, watched: &[&str], l: &str) {
        for (slot, name) in self.captures.iter_mut().zip(watched) {
            if !l.contains(name) {
                continue;
            }
            let values = slot.get_or_insert_with(Vec::new);

            if l.split(' ').next() == Some(*name) {
                if name.starts_with('S') {
                    let ts = l.split_whitespace().last().and_then(|t| t.parse::<i64>().ok());
                    if let Some(ts) = ts {
                        values.push(EventValue::Integer(ts));
                    }
                } else if name.starts_with('E') {
                    values.extend(end_times(l).map(EventValue::Float));
                }
            } else if line::is_message(l) {
                if let Some(ts) = line::message_timestamp(l) {
                    values.push(EventValue::Integer(ts));
                }
            }
        }
    }
}

/// Floats that directly follow the first tab of each space-separated token.
///
/// `EFIX L   1001\t1100\t100` yields `1100.0`; padded columns such as
/// `52\t` have nothing after their tab and yield nothing.
fn end_times(l: &str) -> impl Iterator<Item = f64> + '_ {
    l.split(' ').filter_map(|token| {
        let (_, after) = token.split_once('\t')?;
        let field = after.split('\t').next()?;
        if field.is_empty() {
            return None;
        }
        field.parse().ok()
    })
}

/// Segments an ASC log into [`TrialEvent`]s.
#[derive(Debug, Clone)]
pub struct TrialEventExtractor<'a> {
    start_message: &'a str,
    end_message: Option<&'a str>,
    watch: Vec<String>,
}

impl<'a> TrialEventExtractor<'a> {
    /// `settings` should be the record already extracted from the same log;
    /// its eye-movement tokens are added to the watch-list.
    pub fn new(
        start_message: &'a str,
        end_message: Option<&'a str>,
        saved_events: &[String],
        settings: Option<&Settings>,
    ) -> Self {
        Self {
            start_message,
            end_message,
            watch: watch_list(saved_events, settings),
        }
    }

    /// Full watch-list, mandatory names included.
    pub fn watch_list(&self) -> &[String] {
        &self.watch
    }

    /// Run the state machine over the whole log.
    pub fn extract(&self, log: &AscLog) -> EventTable {
        let watched: Vec<&str> = self
            .watch
            .iter()
            .map(String::as_str)
            .filter(|name| !MANDATORY_EVENTS.contains(name))
            .collect();

        let mut table = EventTable::new();
        let mut t0: Option<i64> = None;
        let mut last_seen: Option<i64> = None;
        let mut state = TrialState::WaitingStart;

        let mut lines = log.iter().peekable();
        while let Some(l) = lines.next() {
            let is_last = lines.peek().is_none();
            let ts = line::line_timestamp(l);
            if ts.is_some() {
                last_seen = ts;
            }
            let start = self.start_timestamp(l);

            state = match state {
                TrialState::WaitingStart => match start {
                    Some(t_start) => self.open(t_start, l, &watched, &mut t0),
                    None => TrialState::WaitingStart,
                },
                TrialState::InTrial(mut acc) => match (self.end_message, start) {
                    (Some(end), _) if l.contains(end) => {
                        self.close(&mut table, acc, ts.or(last_seen), &watched, t0);
                        TrialState::WaitingStart
                    }
                    (None, Some(t_start)) => {
                        self.close(&mut table, acc, ts.or(last_seen), &watched, t0);
                        self.open(t_start, l, &watched, &mut t0)
                    }
                    _ if is_last => {
                        self.close(&mut table, acc, ts.or(last_seen), &watched, t0);
                        TrialState::WaitingStart
                    }
                    _ => {
                        acc.accumulate(&watched, l);
                        TrialState::InTrial(acc)
                    }
                },
            };
        }

        if let TrialState::InTrial(acc) = state {
            let t_end = log.iter().last().and_then(line::line_timestamp).or(last_seen);
            debug!(t_start = acc.t_start, "closing trial opened on the last line");
            self.close(&mut table, acc, t_end, &watched, t0);
        }

        debug!(trials = table.len(), watched = ?watched, "segmented trials");
        table
    }

    /// Timestamp of a start-message line, if `l` is one.
    fn start_timestamp(&self, l: &str) -> Option<i64> {
        if !l.contains(self.start_message) {
            return None;
        }
        let ts = line::message_timestamp(l);
        if ts.is_none() {
            debug!(line = l, "start message without timestamp ignored");
        }
        ts
    }

    fn open(&self, t_start: i64, l: &str, watched: &[&str], t0: &mut Option<i64>) -> TrialState {
        t0.get_or_insert(t_start);
        let mut acc = TrialAccumulator {
            t_start,
            event_identifier: line::message_text(l).map(str::to_string),
            captures: vec![None; watched.len()],
        };
        acc.accumulate(watched, l);
        TrialState::InTrial(acc)
    }

    fn close(
        &self,
        table: &mut EventTable,
        acc: TrialAccumulator,
        t_end: Option<i64>,
        watched: &[&str],
        t0: Option<i64>,
    ) {
        let t0 = t0.unwrap_or(acc.t_start);
        let t_end = t_end.unwrap_or(acc.t_start);

        let fields = watched
            .iter()
            .zip(acc.captures)
            .map(|(name, captured)| (name.to_string(), EventValue::collapse(captured)))
            .collect();

        table.push(TrialEvent {
            onset: Some((acc.t_start as f64 - t0 as f64) / 1000.0),
            duration: Some((t_end as f64 - acc.t_start as f64) / 1000.0),
            sample: Some(acc.t_start),
            trial: table.len() as u32 + 1,
            event_identifier: acc.event_identifier,
            fields,
        });
    }
}
