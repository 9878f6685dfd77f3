use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer, Serialize};

use crate::checkin::history::{EventType, HistoryRecord, SubmissionStatus};

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PresenceRequest {
    pub user_id: String,
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct ServiceReply<T> {
    pub status: StatusCode,
    pub body: Option<T>,
    pub message: Option<String>,
}

impl<T> ServiceReply<T> {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Extracts `{ "message": "..." }` from a response body, ignoring anything else.
pub fn message_from_body(bytes: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(bytes).ok()?;
    value
        .get("message")?
        .as_str()
        .map(str::to_string)
        .filter(|m| !m.trim().is_empty())
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRequest {
    pub first_name: String,
    pub last_name: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
}

/// Entry as returned by the attendance service. Every field is optional and read
/// leniently; gaps are filled from a locally built record in `into_record`.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub display_name: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub event_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    };
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// RFC 3339, offset-less ISO-8601 (read as UTC), or epoch milliseconds.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Some(ts) = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    {
        return Some(ts.and_utc());
    }
    raw.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis)
}

impl AttendanceEntry {
    pub fn display_name(&self) -> Option<String> {
        if let Some(name) = &self.display_name {
            return Some(name.trim().to_string());
        }
        let first = self.first_name.as_deref().unwrap_or_default().trim();
        let last = self.last_name.as_deref().unwrap_or_default().trim();
        Some(format!("{first} {last}").trim().to_string()).filter(|n| !n.is_empty())
    }

    pub fn into_record(self, fallback: HistoryRecord) -> HistoryRecord {
        let display_name = self.display_name().or(fallback.display_name);
        let status = match self.status.as_deref().map(|s| s.trim().to_ascii_lowercase()) {
            Some(s) if s == "error" => SubmissionStatus::Error,
            Some(_) | None => SubmissionStatus::Success,
        };
        HistoryRecord {
            id: self.id.unwrap_or(fallback.id),
            event_type: self
                .event_type
                .and_then(|t| t.parse().ok())
                .unwrap_or(fallback.event_type),
            timestamp: self
                .timestamp
                .as_deref()
                .and_then(parse_timestamp)
                .unwrap_or(fallback.timestamp),
            status,
            display_name,
        }
    }
}
