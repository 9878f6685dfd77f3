use std::sync::LazyLock;

use regex::Regex;

use crate::checkin::error::CheckinError;

// Latin letters including the Latin-1 accented range, whitespace, apostrophe, hyphen.
static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-ZÀ-ÿ\s'-]+$").expect("name pattern compiles"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameField {
    FirstName,
    LastName,
}

impl std::fmt::Display for NameField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            NameField::FirstName => "first name",
            NameField::LastName => "last name",
        })
    }
}

pub fn is_valid_name(name: &str) -> bool {
    !name.trim().is_empty() && NAME_PATTERN.is_match(name)
}

pub fn validate_name(field: NameField, name: &str) -> Result<(), CheckinError> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(CheckinError::InvalidName(field))
    }
}

/// First name is checked before last name; the first failure wins.
pub fn validate_names(first_name: &str, last_name: &str) -> Result<(), CheckinError> {
    validate_name(NameField::FirstName, first_name)?;
    validate_name(NameField::LastName, last_name)
}

/// Returns the trimmed token, or `MissingToken` when there is nothing to submit.
pub fn validate_token(token: Option<&str>) -> Result<&str, CheckinError> {
    token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(CheckinError::MissingToken)
}
