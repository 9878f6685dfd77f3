use thiserror::Error;

use crate::checkin::validation::NameField;

/// Reasons a submission was never sent. None of them create a history record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckinError {
    #[error("scan the QR code before submitting")]
    MissingToken,
    #[error("{0} must only contain letters, spaces, apostrophes or hyphens")]
    InvalidName(NameField),
    #[error("please wait until your network address has been retrieved")]
    OriginPending,
    #[error("unable to retrieve your network address: {0}")]
    OriginUnavailable(String),
    #[error("you must connect through the approved network")]
    OriginRejected { resolved: String },
    #[error("a submission is already in progress")]
    AlreadySubmitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Precondition,
    AuthorizationGate,
    Busy,
}

impl CheckinError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckinError::MissingToken | CheckinError::InvalidName(_) => ErrorKind::Validation,
            CheckinError::OriginPending | CheckinError::OriginUnavailable(_) => {
                ErrorKind::Precondition
            }
            CheckinError::OriginRejected { .. } => ErrorKind::AuthorizationGate,
            CheckinError::AlreadySubmitting => ErrorKind::Busy,
        }
    }
}

/// Camera or decoder failure. Kept apart from submission failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("camera access was denied, check the permissions")]
    PermissionDenied,
    #[error("unable to start the camera: {0}")]
    CameraUnavailable(String),
    #[error("no QR code could be decoded")]
    NoCodeFound,
}
