//! Event and batch types
//!
//! An [`Event`] is an opaque JSON object produced by the instrumentation layer.
//! Sextant never inspects its fields; it only serializes them into the insert
//! request and into diagnostic log lines.

use super::errors::SextantError;
use super::result::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A single analytics event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(Map<String, Value>);

impl Event {
    /// Creates an event from a JSON value, which must be an object
    ///
    /// # Examples
    ///
    /// ```
    /// use sextant::domain::Event;
    /// use serde_json::json;
    ///
    /// let event = Event::new(json!({"event_type": "web_request"})).unwrap();
    /// assert_eq!(event.get("event_type"), Some(&json!("web_request")));
    /// assert!(Event::new(json!([1, 2])).is_err());
    /// ```
    pub fn new(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(SextantError::Validation(format!(
                "Event must be a JSON object, got: {other}"
            ))),
        }
    }

    /// Looks up a field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Borrow the underlying fields
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Event {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.0) {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "{:?}", self.0),
        }
    }
}

/// An ordered group of events submitted in one insert request
///
/// Order is kept so rejection indices reported by the warehouse can be mapped
/// back to the caller's events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch(Vec<Event>);

impl Batch {
    /// Creates a batch from events
    pub fn new(events: Vec<Event>) -> Self {
        Self(events)
    }

    /// Number of events in the batch
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the batch is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the events in submission order
    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.0.iter()
    }

    /// Borrow the events
    pub fn events(&self) -> &[Event] {
        &self.0
    }
}

impl From<Vec<Event>> for Batch {
    fn from(events: Vec<Event>) -> Self {
        Self(events)
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Parse events from either a JSON array or newline-delimited JSON objects
///
/// Blank lines in JSON-lines input are skipped. Errors name the offending line.
pub fn parse_events(input: &str) -> Result<Vec<Event>> {
    let trimmed = input.trim_start();
    if trimmed.starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(trimmed)?;
        return values.into_iter().map(Event::new).collect();
    }

    let mut events = Vec::new();
    for (line_no, line) in input.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line).map_err(|e| {
            SextantError::Serialization(format!("line {}: {}", line_no + 1, e))
        })?;
        events.push(Event::new(value).map_err(|e| {
            SextantError::Validation(format!("line {}: {}", line_no + 1, e))
        })?);
    }
    Ok(events)
}
