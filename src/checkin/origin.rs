//! Network-origin gate for the form flow.
//!
//! The check is advisory: it runs on the client and trusts the client's own view of its
//! public address. The attendance service has to re-verify on its side.

use tracing::{info, warn};

use crate::checkin::error::CheckinError;
use crate::client::ipify::services::IpifyServices::OriginResolver;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OriginState {
    #[default]
    Pending,
    Resolved(String),
    Unavailable(String),
}

impl OriginState {
    pub async fn resolve(resolver: &dyn OriginResolver) -> Self {
        match resolver.resolve().await {
            Ok(ip) if !ip.is_empty() => {
                info!(%ip, "resolved public network address");
                OriginState::Resolved(ip)
            }
            Ok(_) => {
                warn!("public address lookup returned an empty address");
                OriginState::Unavailable("empty address".to_string())
            }
            Err(e) => {
                warn!("public address lookup failed: {e}");
                OriginState::Unavailable(e.to_string())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct OriginGate {
    allowed: String,
}

impl OriginGate {
    pub fn new(allowed: impl Into<String>) -> Self {
        Self { allowed: allowed.into().trim().to_string() }
    }

    pub fn allowed(&self) -> &str {
        &self.allowed
    }

    pub fn require_resolved<'a>(&self, origin: &'a OriginState) -> Result<&'a str, CheckinError> {
        match origin {
            OriginState::Pending => Err(CheckinError::OriginPending),
            OriginState::Unavailable(reason) => Err(CheckinError::OriginUnavailable(reason.clone())),
            OriginState::Resolved(ip) => Ok(ip),
        }
    }

    /// Exact string match against the single allowed address.
    pub fn check(&self, resolved: &str) -> Result<(), CheckinError> {
        if resolved == self.allowed {
            Ok(())
        } else {
            Err(CheckinError::OriginRejected { resolved: resolved.to_string() })
        }
    }
}
