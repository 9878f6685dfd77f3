use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{error, info, warn};

use crate::checkin::error::CheckinError;
use crate::checkin::form::FormCapture;
use crate::checkin::history::{EventType, HistoryLedger, HistoryRecord, SubmissionStatus};
use crate::checkin::origin::{OriginGate, OriginState};
use crate::checkin::state::{SubmissionCell, SubmissionOutcome, SubmissionState, lock};
use crate::client::attendance::services::AttendanceServices::AttendanceService;
use crate::client::error::ApiError;
use crate::client::ipify::services::IpifyServices::OriginResolver;

pub const FORM_FAILURE_MESSAGE: &str = "An error occurred while recording the check-in.";

/// Name-form check-in, gated on the device's public network address.
pub struct FormCheckin {
    service: Arc<dyn AttendanceService>,
    gate: OriginGate,
    origin: Mutex<OriginState>,
    form: Mutex<FormCapture>,
    submission: SubmissionCell,
    ledger: Mutex<HistoryLedger>,
}

impl FormCheckin {
    pub fn new(service: Arc<dyn AttendanceService>, gate: OriginGate) -> Self {
        Self {
            service,
            gate,
            origin: Mutex::new(OriginState::Pending),
            form: Mutex::new(FormCapture::default()),
            submission: SubmissionCell::new(),
            ledger: Mutex::new(HistoryLedger::new()),
        }
    }

    pub fn set_first_name(&self, value: impl Into<String>) {
        lock(&self.form).first_name = value.into();
    }

    pub fn set_last_name(&self, value: impl Into<String>) {
        lock(&self.form).last_name = value.into();
    }

    pub fn set_event_type(&self, event_type: EventType) {
        lock(&self.form).event_type = event_type;
    }

    pub fn fill(&self, form: FormCapture) {
        *lock(&self.form) = form;
    }

    pub fn form(&self) -> FormCapture {
        lock(&self.form).clone()
    }

    pub fn origin(&self) -> OriginState {
        lock(&self.origin).clone()
    }

    pub fn set_origin(&self, origin: OriginState) {
        *lock(&self.origin) = origin;
    }

    pub async fn resolve_origin(&self, resolver: &dyn OriginResolver) -> OriginState {
        let origin = OriginState::resolve(resolver).await;
        self.set_origin(origin.clone());
        origin
    }

    /// Seeds the ledger with entries the service already holds for today.
    pub async fn load_today(&self) -> Result<usize, ApiError> {
        let entries = self.service.fetch_today().await.inspect_err(|e| {
            error!("could not load today's check-ins: {e}");
        })?;
        let count = entries.len();
        let loaded_at = Utc::now();
        lock(&self.ledger).seed(entries.into_iter().map(|entry| {
            entry.into_record(HistoryRecord::new(
                EventType::Arrival,
                SubmissionStatus::Success,
                loaded_at,
                None,
            ))
        }));
        info!(count, "loaded today's check-ins");
        Ok(count)
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

    pub async fn submit(&self) -> Result<SubmissionOutcome, CheckinError> {
        if self.submission.is_submitting() {
            return Err(CheckinError::AlreadySubmitting);
        }

        let form = self.form();
        let request = form.to_request()?;
        let origin = self.origin();
        let resolved = self.gate.require_resolved(&origin)?;

        let in_flight = self.submission.try_begin().ok_or(CheckinError::AlreadySubmitting)?;

        // Dropping `in_flight` here puts the state back to idle.
        if let Err(e) = self.gate.check(resolved) {
            warn!(resolved, allowed = self.gate.allowed(), "check-in from outside the approved network");
            return Err(e);
        }

        let result = self.service.record_attendance(&request).await;
        let completed_at = Utc::now();

        match result {
            Ok(reply) if reply.is_success() => {
                let local = HistoryRecord::new(
                    request.event_type,
                    SubmissionStatus::Success,
                    completed_at,
                    Some(form.display_name()),
                );
                // A 2xx is a success whatever the body says.
                let record = match reply.body {
                    Some(entry) => HistoryRecord {
                        status: SubmissionStatus::Success,
                        ..entry.into_record(local)
                    },
                    None => local,
                };
                lock(&self.ledger).append(record.clone());
                lock(&self.form).reset();
                info!(event_type = %request.event_type, "check-in recorded");
                in_flight.succeed(record.clone());

                Ok(SubmissionOutcome {
                    status: SubmissionStatus::Success,
                    message: None,
                    completed_at,
                    record: Some(record),
                })
            }
            Ok(reply) => {
                warn!(status = %reply.status, "check-in rejected by the attendance service");
                let message = reply.message.unwrap_or_else(|| FORM_FAILURE_MESSAGE.to_string());
                let record = HistoryRecord::new(
                    request.event_type,
                    SubmissionStatus::Error,
                    completed_at,
                    Some(form.display_name()),
                );
                lock(&self.ledger).append(record.clone());
                in_flight.fail(message.clone());

                Ok(SubmissionOutcome {
                    status: SubmissionStatus::Error,
                    message: Some(message),
                    completed_at,
                    record: Some(record),
                })
            }
            Err(e) => {
                error!("check-in could not be sent: {e}");
                in_flight.fail(FORM_FAILURE_MESSAGE);

                Ok(SubmissionOutcome {
                    status: SubmissionStatus::Error,
                    message: Some(FORM_FAILURE_MESSAGE.to_string()),
                    completed_at,
                    record: None,
                })
            }
        }
    }
}
