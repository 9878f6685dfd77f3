//! Check-in workflow: capture, validation, origin gate, submission and history.

pub mod error;
pub mod form;
pub mod form_checkin;
pub mod history;
pub mod origin;
pub mod scan;
pub mod scan_checkin;
pub mod state;
pub mod validation;
