#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use tokio::sync::Notify;

use presence_checkin::checkin::history::EventType;
use presence_checkin::client::attendance::models::AttendanceModels::{
    AttendanceEntry, AttendanceRequest, PresenceRequest, ServiceReply,
};
use presence_checkin::client::attendance::services::AttendanceServices::AttendanceService;
use presence_checkin::client::error::ApiError;
use presence_checkin::client::ipify::services::IpifyServices::OriginResolver;

pub const OFFICE_IP: &str = "137.255.98.194";

type Scripted<T> = Mutex<VecDeque<Result<ServiceReply<T>, ApiError>>>;

/// Attendance service that replays scripted replies and records every request.
#[derive(Default)]
pub struct FakeAttendanceService {
    presence: Scripted<serde_json::Value>,
    attendance: Scripted<AttendanceEntry>,
    today: Mutex<Option<Result<Vec<AttendanceEntry>, ApiError>>>,
    pub presence_calls: Mutex<Vec<PresenceRequest>>,
    pub attendance_calls: Mutex<Vec<AttendanceRequest>>,
    /// When set, every submission waits for a permit before replying.
    pub hold: Option<Arc<Notify>>,
}

impl FakeAttendanceService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn held(notify: Arc<Notify>) -> Self {
        Self { hold: Some(notify), ..Self::default() }
    }

    pub fn push_presence(&self, reply: Result<ServiceReply<serde_json::Value>, ApiError>) {
        self.presence.lock().unwrap().push_back(reply);
    }

    pub fn push_attendance(&self, reply: Result<ServiceReply<AttendanceEntry>, ApiError>) {
        self.attendance.lock().unwrap().push_back(reply);
    }

    pub fn set_today(&self, today: Result<Vec<AttendanceEntry>, ApiError>) {
        *self.today.lock().unwrap() = Some(today);
    }

    pub fn presence_requests(&self) -> Vec<PresenceRequest> {
        self.presence_calls.lock().unwrap().clone()
    }

    pub fn attendance_requests(&self) -> Vec<AttendanceRequest> {
        self.attendance_calls.lock().unwrap().clone()
    }

    async fn wait_for_release(&self) {
        if let Some(notify) = &self.hold {
            notify.notified().await;
        }
    }
}

#[async_trait]
impl AttendanceService for FakeAttendanceService {
    async fn submit_presence(
        &self,
        request: &PresenceRequest,
    ) -> Result<ServiceReply<serde_json::Value>, ApiError> {
        self.presence_calls.lock().unwrap().push(request.clone());
        self.wait_for_release().await;
        let next = self.presence.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(presence_ok()))
    }

    async fn record_attendance(
        &self,
        request: &AttendanceRequest,
    ) -> Result<ServiceReply<AttendanceEntry>, ApiError> {
        self.attendance_calls.lock().unwrap().push(request.clone());
        self.wait_for_release().await;
        let next = self.attendance.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(attendance_ok(request)))
    }

    async fn fetch_today(&self) -> Result<Vec<AttendanceEntry>, ApiError> {
        self.today.lock().unwrap().take().unwrap_or_else(|| Ok(Vec::new()))
    }
}

pub fn presence_ok() -> ServiceReply<serde_json::Value> {
    ServiceReply { status: StatusCode::OK, body: Some(serde_json::json!({})), message: None }
}

pub fn rejected<T>(status: StatusCode, message: Option<&str>) -> ServiceReply<T> {
    ServiceReply { status, body: None, message: message.map(str::to_string) }
}

pub fn transport_failure() -> ApiError {
    ApiError::Transport("connection reset by peer".to_string())
}

pub fn entry(id: &str, first_name: &str, last_name: &str, event_type: EventType) -> AttendanceEntry {
    AttendanceEntry {
        id: Some(id.to_string()),
        first_name: Some(first_name.to_string()),
        last_name: Some(last_name.to_string()),
        event_type: Some(event_type.to_string()),
        timestamp: Some(Utc::now().to_rfc3339()),
        ..AttendanceEntry::default()
    }
}

/// What the service echoes back for an accepted form submission.
pub fn attendance_ok(request: &AttendanceRequest) -> ServiceReply<AttendanceEntry> {
    ServiceReply {
        status: StatusCode::CREATED,
        body: Some(entry("srv-1", &request.first_name, &request.last_name, request.event_type)),
        message: None,
    }
}

pub struct FixedResolver(pub Result<String, String>);

#[async_trait]
impl OriginResolver for FixedResolver {
    async fn resolve(&self) -> Result<String, ApiError> {
        self.0.clone().map_err(ApiError::Transport)
    }
}
