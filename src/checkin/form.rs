use crate::checkin::error::CheckinError;
use crate::checkin::history::EventType;
use crate::checkin::validation::validate_names;
use crate::client::attendance::models::AttendanceModels::AttendanceRequest;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormCapture {
    pub first_name: String,
    pub last_name: String,
    pub event_type: EventType,
}

impl FormCapture {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>, event_type: EventType) -> Self {
        Self { first_name: first_name.into(), last_name: last_name.into(), event_type }
    }

    /// Validated, trimmed request for the attendance service.
    pub fn to_request(&self) -> Result<AttendanceRequest, CheckinError> {
        validate_names(&self.first_name, &self.last_name)?;
        Ok(AttendanceRequest {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            event_type: self.event_type,
        })
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim()).trim().to_string()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
