use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::SystemTime;

/// Document metadata, organized in named sections (`document`, `dataset`,
/// `column`, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, Map<String, Value>>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(&self, name: &str) -> Option<&Map<String, Value>> {
        self.0.get(name)
    }

    pub fn sections(&self) -> impl Iterator<Item = (&String, &Map<String, Value>)> {
        self.0.iter()
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&Value> {
        self.0.get(section).and_then(|s| s.get(key))
    }

    pub fn get_str(&self, section: &str, key: &str) -> Option<&str> {
        self.get(section, key).and_then(Value::as_str)
    }

    /// Set a single value, replacing any previous one
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<Value>) {
        self.0
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    /// Set a value only if the key is not there yet
    pub fn set_default(&mut self, section: &str, key: &str, value: impl Into<Value>) {
        self.0
            .entry(section.to_string())
            .or_default()
            .entry(key.to_string())
            .or_insert_with(|| value.into());
    }

    /// Merge values into a section; incoming values win
    pub fn add_metadata(&mut self, section: &str, values: Map<String, Value>) {
        self.0.entry(section.to_string()).or_default().extend(values);
    }

    /// Merge all sections of another metadata object; incoming values win
    pub fn merge(&mut self, other: &Metadata) {
        for (name, values) in other.sections() {
            self.add_metadata(name, values.clone());
        }
    }

    /// Fill in origin and date of the document, if not already present
    pub fn add_default_meta(&mut self, origin: Option<&str>, date: Option<String>) {
        if let Some(origin) = origin {
            self.set_default("document", "origin", origin);
        }
        if let Some(date) = date {
            self.set_default("document", "date", date);
        }
    }

    /// Build a section from `NAME=VALUE` strings
    pub fn parse_assignments<S: AsRef<str>>(items: &[S]) -> Map<String, Value> {
        items
            .iter()
            .map(|item| match item.as_ref().split_once('=') {
                Some((k, v)) => (k.to_string(), Value::String(v.to_string())),
                None => (item.as_ref().to_string(), Value::String(String::new())),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// ISO-8601 timestamp (UTC, second precision)
pub fn iso_timestamp(time: SystemTime) -> String {
    let time: DateTime<Utc> = time.into();
    time.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Modification time of a file, as an ISO-8601 string
pub fn file_date(path: &Path) -> Option<String> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(iso_timestamp)
}
