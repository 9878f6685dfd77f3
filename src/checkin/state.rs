use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::checkin::history::{HistoryRecord, SubmissionStatus};

/// Locks a mutex, recovering the value if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Succeeded(HistoryRecord),
    Failed(String),
}

impl SubmissionState {
    pub fn is_submitting(&self) -> bool {
        matches!(self, SubmissionState::Submitting)
    }
}

/// Result of one submission that reached the attendance service (or tried to).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub status: SubmissionStatus,
    pub message: Option<String>,
    pub completed_at: DateTime<Utc>,
    pub record: Option<HistoryRecord>,
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        self.status == SubmissionStatus::Success
    }
}

#[derive(Debug, Default)]
pub struct SubmissionCell {
    state: Mutex<SubmissionState>,
}

impl SubmissionCell {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SubmissionState> {
        lock(&self.state)
    }

    pub fn current(&self) -> SubmissionState {
        self.lock().clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.lock().is_submitting()
    }

    pub fn acknowledge(&self) {
        let mut state = self.lock();
        if !state.is_submitting() {
            *state = SubmissionState::Idle;
        }
    }

    /// Enters `Submitting`, or returns `None` when a submission is already in flight.
    pub fn try_begin(&self) -> Option<InFlight<'_>> {
        let mut state = self.lock();
        if state.is_submitting() {
            return None;
        }
        *state = SubmissionState::Submitting;
        Some(InFlight { cell: self, settled: false })
    }
}

/// Marks an in-flight submission. Dropping it unsettled returns the cell to `Idle`,
/// which covers early returns and cancelled futures.
#[must_use]
pub struct InFlight<'a> {
    cell: &'a SubmissionCell,
    settled: bool,
}

impl InFlight<'_> {
    pub fn succeed(mut self, record: HistoryRecord) {
        *self.cell.lock() = SubmissionState::Succeeded(record);
        self.settled = true;
    }

    pub fn fail(mut self, reason: impl Into<String>) {
        *self.cell.lock() = SubmissionState::Failed(reason.into());
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            *self.cell.lock() = SubmissionState::Idle;
        }
    }
}
