//! Console logging plus a daily CSV log file (`logs-YYYY-MM-DD.csv`).

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

pub fn init(log_dir: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(CsvLogLayer::new(log_dir));
    if registry.try_init().is_err() {
        eprintln!("A global logger was already installed.");
    }
}

pub fn log_file_path(dir: &Path, now: DateTime<Utc>) -> PathBuf {
    dir.join(format!("logs-{}.csv", now.format("%Y-%m-%d")))
}

/// Appends one `timestamp,level,target,message` row to the file for `now`'s day.
pub fn log_to_csv(dir: &Path, now: DateTime<Utc>, level: &str, target: &str, message: &str) {
    let path = log_file_path(dir, now);
    match OpenOptions::new().append(true).create(true).open(&path) {
        Ok(file) => {
            let mut writer = csv::Writer::from_writer(file);
            if writer.write_record([now.to_rfc3339().as_str(), level, target, message]).is_ok() {
                let _ = writer.flush();
            }
        }
        Err(e) => eprintln!("Unable to open log file {}: {e}", path.display()),
    }
}

pub struct CsvLogLayer {
    dir: PathBuf,
}

impl CsvLogLayer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl<S: Subscriber> Layer<S> for CsvLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let metadata = event.metadata();
        let level = level_name(*metadata.level());
        log_to_csv(&self.dir, Utc::now(), level, metadata.target(), &visitor.finish());
    }
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARN",
        Level::INFO => "INFO",
        Level::DEBUG => "DEBUG",
        Level::TRACE => "TRACE",
    }
}

/// Flattens an event into `message key=value ...`.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        match (self.message.is_empty(), self.fields.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.fields,
            (false, false) => format!("{} {}", self.message, self.fields),
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push(field, format_args!("{value}"));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.push(field, format_args!("{value:?}"));
        }
    }
}

impl MessageVisitor {
    fn push(&mut self, field: &Field, value: std::fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={}", field.name(), value);
    }
}
