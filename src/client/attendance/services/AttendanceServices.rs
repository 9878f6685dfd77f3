use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, info, warn};

use crate::client::attendance::models::AttendanceModels::{
    AttendanceEntry, AttendanceRequest, PresenceRequest, ServiceReply, message_from_body,
};
use crate::client::error::ApiError;

/// Remote attendance service as seen by the check-in flows.
#[async_trait]
pub trait AttendanceService: Send + Sync {
    async fn submit_presence(
        &self,
        request: &PresenceRequest,
    ) -> Result<ServiceReply<serde_json::Value>, ApiError>;

    /// `POST {base}/attendance`. A 2xx reply carries the stored entry when the body is readable.
    async fn record_attendance(
        &self,
        request: &AttendanceRequest,
    ) -> Result<ServiceReply<AttendanceEntry>, ApiError>;

    async fn fetch_today(&self) -> Result<Vec<AttendanceEntry>, ApiError>;
}

pub struct HttpAttendanceService {
    client: reqwest::Client,
    presence_url: String,
    attendance_base: String,
}

impl HttpAttendanceService {
    pub fn new(presence_url: impl Into<String>, attendance_base: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), presence_url, attendance_base)
    }

    pub fn with_client(
        client: reqwest::Client,
        presence_url: impl Into<String>,
        attendance_base: impl Into<String>,
    ) -> Self {
        Self {
            client,
            presence_url: presence_url.into(),
            attendance_base: attendance_base.into().trim_end_matches('/').to_string(),
        }
    }

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }
}

#[async_trait]
impl AttendanceService for HttpAttendanceService {
    async fn submit_presence(
        &self,
        request: &PresenceRequest,
    ) -> Result<ServiceReply<serde_json::Value>, ApiError> {
        info!(url = %self.presence_url, "submitting presence scan");

        let res = self
            .client
            .post(&self.presence_url)
            .headers(Self::headers())
            .json(request)
            .send()
            .await?;

        let status = res.status();
        let bytes = res.bytes().await?;
        debug!(%status, len = bytes.len(), "presence response");

        if status.is_success() {
            let body: serde_json::Value = serde_json::from_slice(&bytes)?;
            Ok(ServiceReply { status, body: Some(body), message: None })
        } else {
            Ok(ServiceReply { status, body: None, message: message_from_body(&bytes) })
        }
    }

    async fn record_attendance(
        &self,
        request: &AttendanceRequest,
    ) -> Result<ServiceReply<AttendanceEntry>, ApiError> {
        let url = format!("{}/attendance", self.attendance_base);
        info!(url = %url, event_type = %request.event_type, "recording attendance");

        let res = self
            .client
            .post(&url)
            .headers(Self::headers())
            .json(request)
            .send()
            .await?;

        let status = res.status();
        let bytes = res.bytes().await?;
        debug!(%status, len = bytes.len(), "attendance response");

        if status.is_success() {
            let entry = serde_json::from_slice::<AttendanceEntry>(&bytes)
                .inspect_err(|e| warn!(%status, "unreadable attendance body, keeping local record: {e}"))
                .ok();
            Ok(ServiceReply { status, body: entry, message: None })
        } else {
            Ok(ServiceReply { status, body: None, message: message_from_body(&bytes) })
        }
    }

    async fn fetch_today(&self) -> Result<Vec<AttendanceEntry>, ApiError> {
        let url = format!("{}/attendance/today", self.attendance_base);

        let res = self.client.get(&url).headers(Self::headers()).send().await?;

        if !res.status().is_success() {
            return Err(ApiError::Status(res.status()));
        }

        let bytes = res.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
