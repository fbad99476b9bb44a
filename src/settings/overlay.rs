//! Settings overlays from side files.
//!
//! Values supplied by the user (a settings JSON file, info table columns)
//! overwrite what the log produced. Blank values never overwrite, and keys
//! outside the sidecar are dropped so the key set stays closed.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::warn;

use super::{is_blank, Settings};

impl Settings {
    /// Apply every non-blank value of `overrides`.
    ///
    /// Returns the keys that were ignored because they are not sidecar keys.
    ///
    /// # Errors
    ///
    /// Returns an error naming the key if a value has the wrong JSON type
    /// for its field (for example a string for `SamplingFrequency`).
    pub fn overlay(&mut self, overrides: &Map<String, Value>) -> Result<Vec<String>> {
        let mut ignored = Vec::new();
        let mut merged = self.to_json_map();

        for (key, value) in overrides {
            if !Settings::is_key(key) {
                warn!(key = %key, "ignoring unknown settings key");
                ignored.push(key.clone());
                continue;
            }
            if is_blank(value) {
                continue;
            }
            check_value(key, value)?;
            merged.insert(key.clone(), value.clone());
        }

        *self = serde_json::from_value(Value::Object(merged))
            .context("Failed to rebuild settings after overlay")?;
        Ok(ignored)
    }

    /// Apply a settings JSON document (an object of sidecar keys).
    pub fn overlay_json_str(&mut self, json: &str) -> Result<Vec<String>> {
        let value: Value = serde_json::from_str(json).context("Failed to parse settings JSON")?;
        match value {
            Value::Object(map) => self.overlay(&map),
            _ => anyhow::bail!("Settings JSON must be an object"),
        }
    }

    /// Set one field from a text cell of a table.
    ///
    /// The text is decoded as JSON when that yields a value of the right
    /// type (`1000`, `[47.2, 29.5]`), and used as a plain string otherwise.
    /// Returns `false` if `key` is not a sidecar key or the cell is blank.
    pub fn set_from_text(&mut self, key: &str, text: &str) -> Result<bool> {
        if !Settings::is_key(key) {
            return Ok(false);
        }

        let text = text.trim();
        if text.is_empty() {
            return Ok(false);
        }

        let decoded = serde_json::from_str::<Value>(text)
            .ok()
            .filter(|value| check_value(key, value).is_ok());
        let value = decoded.unwrap_or_else(|| Value::String(text.to_string()));

        let mut single = Map::new();
        single.insert(key.to_string(), value);
        self.overlay(&single)
            .with_context(|| format!("Invalid value {:?} for setting {}", text, key))?;
        Ok(true)
    }
}

/// Check that `value` has an acceptable type for the field `key`.
fn check_value(key: &str, value: &Value) -> Result<()> {
    let mut single = Map::new();
    single.insert(key.to_string(), value.clone());
    serde_json::from_value::<Settings>(Value::Object(single))
        .map(|_| ())
        .with_context(|| format!("Setting {} has an invalid value: {}", key, value))
}
