//! Rolling, newest-first history of completed submission attempts.
//!
//! Records live for the process lifetime only. Appending is the only mutation and every
//! completed attempt gets its own record, identical or not.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const VISIBLE_HISTORY: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    #[default]
    Arrival,
    Departure,
}

impl EventType {
    pub fn label(self) -> &'static str {
        match self {
            EventType::Arrival => "Arrival",
            EventType::Departure => "Departure",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            EventType::Arrival => "arrival",
            EventType::Departure => "departure",
        })
    }
}

impl std::str::FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arrival" => Ok(EventType::Arrival),
            "departure" => Ok(EventType::Departure),
            other => Err(format!("unknown event type {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    pub status: SubmissionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl HistoryRecord {
    pub fn new(
        event_type: EventType,
        status: SubmissionStatus,
        timestamp: DateTime<Utc>,
        display_name: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_type,
            timestamp,
            status,
            display_name,
        }
    }

    /// One display line, e.g. `Arrival • 08:59:12 [ok] Jean-Paul O'Neil`.
    pub fn summary(&self, tz: Tz) -> String {
        let time = self.timestamp.with_timezone(&tz).format("%H:%M:%S");
        let status = match self.status {
            SubmissionStatus::Success => "ok",
            SubmissionStatus::Error => "error",
        };
        match &self.display_name {
            Some(name) => format!("{} • {} [{}] {}", self.event_type.label(), time, status, name),
            None => format!("{} • {} [{}]", self.event_type.label(), time, status),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct HistoryLedger {
    records: Vec<HistoryRecord>,
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: HistoryRecord) {
        self.records.insert(0, record);
    }

    /// Adds records fetched from the service behind everything recorded locally.
    /// `older` must already be newest-first.
    pub fn seed(&mut self, older: impl IntoIterator<Item = HistoryRecord>) {
        self.records.extend(older);
    }

    pub fn recent(&self) -> &[HistoryRecord] {
        &self.records[..self.records.len().min(VISIBLE_HISTORY)]
    }

    pub fn all(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
