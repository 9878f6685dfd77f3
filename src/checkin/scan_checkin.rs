use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::checkin::error::{CheckinError, ScanError};
use crate::checkin::history::{EventType, HistoryLedger, HistoryRecord, SubmissionStatus};
use crate::checkin::state::{SubmissionCell, SubmissionOutcome, SubmissionState, lock};
use crate::checkin::validation::validate_token;
use crate::client::attendance::models::AttendanceModels::PresenceRequest;
use crate::client::attendance::services::AttendanceServices::AttendanceService;
use crate::config::device_identity::DeviceIdentifier;

pub const REJECTED_SCAN_MESSAGE: &str = "Invalid QR code or server error.";
pub const SCAN_TRANSPORT_MESSAGE: &str = "An error occurred while sending the check-in.";

/// QR-code check-in: a decoded token is submitted together with the device identifier.
pub struct ScanCheckin {
    service: Arc<dyn AttendanceService>,
    device_id: DeviceIdentifier,
    submission: SubmissionCell,
    token: Mutex<Option<String>>,
    scan_error: Mutex<Option<ScanError>>,
    ledger: Mutex<HistoryLedger>,
}

impl ScanCheckin {
    pub fn new(service: Arc<dyn AttendanceService>, device_id: DeviceIdentifier) -> Self {
        Self {
            service,
            device_id,
            submission: SubmissionCell::new(),
            token: Mutex::new(None),
            scan_error: Mutex::new(None),
            ledger: Mutex::new(HistoryLedger::new()),
        }
    }

    pub fn capture(&self, token: impl Into<String>) {
        *lock(&self.token) = Some(token.into());
        *lock(&self.scan_error) = None;
    }

    pub fn report_scan_error(&self, err: ScanError) {
        warn!("scan failed: {err}");
        *lock(&self.scan_error) = Some(err);
    }

    pub fn token(&self) -> Option<String> {
        lock(&self.token).clone()
    }

    pub fn scan_error(&self) -> Option<ScanError> {
        lock(&self.scan_error).clone()
    }

    pub fn state(&self) -> SubmissionState {
        self.submission.current()
    }

    pub fn is_submitting(&self) -> bool {
        self.submission.is_submitting()
    }

    pub fn acknowledge(&self) {
        self.submission.acknowledge();
    }

    pub fn recent(&self) -> Vec<HistoryRecord> {
        lock(&self.ledger).recent().to_vec()
    }

    pub fn history_len(&self) -> usize {
        lock(&self.ledger).len()
    }

    /// Captures a freshly decoded token and submits it straight away.
    pub async fn on_decoded(&self, token: String) -> Result<SubmissionOutcome, CheckinError> {
        if self.submission.is_submitting() {
            return Err(CheckinError::AlreadySubmitting);
        }
        self.capture(token);
        self.submit().await
    }

    /// Drains decoded tokens until every sender is gone, submitting each one and
    /// handing the result to `report`.
    pub async fn consume<F>(&self, mut decoded: mpsc::Receiver<String>, mut report: F)
    where
        F: FnMut(&Result<SubmissionOutcome, CheckinError>),
    {
        while let Some(token) = decoded.recv().await {
            let result = self.on_decoded(token).await;
            match &result {
                Ok(outcome) if outcome.is_success() => info!("arrival recorded"),
                Ok(outcome) => warn!(message = ?outcome.message, "check-in rejected"),
                Err(e) => warn!("check-in not sent: {e}"),
            }
            report(&result);
        }
    }

    pub async fn submit(&self) -> Result<SubmissionOutcome, CheckinError> {
        if self.submission.is_submitting() {
            return Err(CheckinError::AlreadySubmitting);
        }

        let token = self.token();
        let token = validate_token(token.as_deref())?.to_string();

        let in_flight = self.submission.try_begin().ok_or(CheckinError::AlreadySubmitting)?;

        let request = PresenceRequest { user_id: self.device_id.to_string(), token: token.clone() };
        let result = self.service.submit_presence(&request).await;
        let completed_at = Utc::now();

        let (status, message) = match result {
            Ok(reply) if reply.is_success() => (SubmissionStatus::Success, None),
            Ok(reply) => {
                warn!(status = %reply.status, "presence scan rejected");
                let message = reply.message.unwrap_or_else(|| REJECTED_SCAN_MESSAGE.to_string());
                (SubmissionStatus::Error, Some(message))
            }
            Err(e) => {
                error!("presence scan could not be sent: {e}");
                (SubmissionStatus::Error, Some(SCAN_TRANSPORT_MESSAGE.to_string()))
            }
        };

        let record = HistoryRecord::new(EventType::Arrival, status, completed_at, None);
        lock(&self.ledger).append(record.clone());

        match &message {
            None => {
                let mut current = lock(&self.token);
                if current.as_deref().map(str::trim) == Some(token.as_str()) {
                    *current = None;
                }
                drop(current);
                in_flight.succeed(record.clone());
            }
            Some(reason) => in_flight.fail(reason.clone()),
        }

        Ok(SubmissionOutcome { status, message, completed_at, record: Some(record) })
    }
}
