use std::env;

use chrono_tz::Tz;
use tracing::warn;

pub const DEFAULT_PRESENCE_URL: &str = "http://127.0.0.1:5000/api/presence";
pub const DEFAULT_ATTENDANCE_API_URL: &str = "https://ecoia-attendance.vercel.app/api";
pub const DEFAULT_IP_LOOKUP_URL: &str = "https://api.ipify.org?format=json";
pub const DEFAULT_ALLOWED_ORIGIN_IP: &str = "137.255.98.194";
pub const DEFAULT_DEVICE_STORE_PATH: &str = "device_identity.json";
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Africa::PortoNovo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckinMode {
    Scan,
    Form,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub presence_url: String,
    pub attendance_api_url: String,
    pub ip_lookup_url: String,
    pub allowed_origin_ip: String,
    pub device_store_path: String,
    pub mode: CheckinMode,
    pub log_dir: String,
    pub timezone: Tz,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| -> String {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let mode = match var("CHECKIN_MODE", "form").to_ascii_lowercase().as_str() {
            "scan" => CheckinMode::Scan,
            "form" => CheckinMode::Form,
            other => {
                warn!("Unknown CHECKIN_MODE {other:?}, using form");
                CheckinMode::Form
            }
        };

        let timezone = match lookup("DISPLAY_TIMEZONE") {
            Some(name) => name.trim().parse::<Tz>().unwrap_or_else(|e| {
                warn!("Invalid DISPLAY_TIMEZONE {name:?}: {e}, using {}", DEFAULT_TIMEZONE);
                DEFAULT_TIMEZONE
            }),
            None => DEFAULT_TIMEZONE,
        };

        Config {
            presence_url: var("PRESENCE_URL", DEFAULT_PRESENCE_URL),
            attendance_api_url: var("ATTENDANCE_API_URL", DEFAULT_ATTENDANCE_API_URL)
                .trim_end_matches('/')
                .to_string(),
            ip_lookup_url: var("IP_LOOKUP_URL", DEFAULT_IP_LOOKUP_URL),
            allowed_origin_ip: var("ALLOWED_ORIGIN_IP", DEFAULT_ALLOWED_ORIGIN_IP),
            device_store_path: var("DEVICE_STORE_PATH", DEFAULT_DEVICE_STORE_PATH),
            mode,
            log_dir: var("LOG_DIR", "."),
            timezone,
        }
    }
}
