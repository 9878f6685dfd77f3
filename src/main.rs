use std::sync::Arc;
use std::time::Duration;

use chrono_tz::Tz;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use presence_checkin::checkin::form::FormCapture;
use presence_checkin::checkin::form_checkin::FormCheckin;
use presence_checkin::checkin::history::{EventType, HistoryRecord};
use presence_checkin::checkin::origin::OriginGate;
use presence_checkin::checkin::scan::{LineScanner, capture_until_closed};
use presence_checkin::checkin::scan_checkin::ScanCheckin;
use presence_checkin::client::attendance::services::AttendanceServices::HttpAttendanceService;
use presence_checkin::client::ipify::services::IpifyServices::IpifyResolver;
use presence_checkin::config::config::{CheckinMode, Config};
use presence_checkin::config::device_identity::load_device_identifier;
use presence_checkin::logging;

const SCAN_RETRY_DELAY: Duration = Duration::from_secs(2);

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let env = Config::from_env();
    logging::init(&env.log_dir);
    info!("Application started");
    info!(
        mode = ?env.mode,
        presence_url = %env.presence_url,
        attendance_api_url = %env.attendance_api_url,
        "Configuration loaded"
    );

    let service = Arc::new(HttpAttendanceService::new(
        env.presence_url.clone(),
        env.attendance_api_url.clone(),
    ));

    match env.mode {
        CheckinMode::Scan => run_scan(&env, service).await,
        CheckinMode::Form => run_form(&env, service).await,
    }

    info!("Application stopped");
}

async fn run_scan(env: &Config, service: Arc<HttpAttendanceService>) {
    let device_id = load_device_identifier(&env.device_store_path);
    info!(%device_id, "device identifier ready");

    let checkin = ScanCheckin::new(service, device_id);
    let (tx, rx) = mpsc::channel::<String>(1);
    let mut scanner = LineScanner::new(BufReader::new(tokio::io::stdin()));

    println!("Scan the QR code at the office (one code per line, Ctrl-D to quit).");

    let capture = async {
        capture_until_closed(&mut scanner, &tx, SCAN_RETRY_DELAY, |e| {
            checkin.report_scan_error(e.clone());
            println!("{e}");
        })
        .await;
        drop(tx);
    };

    let consume = checkin.consume(rx, |result| {
        match result {
            Ok(outcome) if outcome.is_success() => println!("Arrival recorded."),
            Ok(outcome) => println!("Error: {}", outcome.message.as_deref().unwrap_or_default()),
            Err(e) => println!("{e}"),
        }
        print_history(&checkin.recent(), env.timezone);
    });

    futures::future::join(capture, consume).await;
}

async fn run_form(env: &Config, service: Arc<HttpAttendanceService>) {
    let checkin = FormCheckin::new(service, OriginGate::new(env.allowed_origin_ip.clone()));
    let resolver = IpifyResolver::new(env.ip_lookup_url.clone());

    let (_, loaded) = futures::future::join(checkin.resolve_origin(&resolver), checkin.load_today()).await;
    if loaded.is_err() {
        println!("Unable to load today's check-ins.");
    }
    print_history(&checkin.recent(), env.timezone);

    println!("Enter `first name;last name[;arrival|departure]` (Ctrl-D to quit).");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Unable to read input: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_form_line(&line) {
            Ok(form) => checkin.fill(form),
            Err(e) => {
                println!("{e}");
                continue;
            }
        }

        match checkin.submit().await {
            Ok(outcome) if outcome.is_success() => println!("Check-in recorded."),
            Ok(outcome) => println!("Error: {}", outcome.message.unwrap_or_default()),
            Err(e) => {
                warn!("check-in blocked: {e}");
                println!("{e}");
            }
        }
        print_history(&checkin.recent(), env.timezone);
    }
}

fn parse_form_line(line: &str) -> Result<FormCapture, String> {
    let mut parts = line.split(';');
    let first_name = parts.next().unwrap_or_default();
    let last_name = parts.next().unwrap_or_default();
    let event_type = match parts.next() {
        Some(raw) if !raw.trim().is_empty() => raw.parse::<EventType>()?,
        _ => EventType::Arrival,
    };
    Ok(FormCapture::new(first_name, last_name, event_type))
}

fn print_history(records: &[HistoryRecord], tz: Tz) {
    if records.is_empty() {
        return;
    }
    println!("Recent history:");
    for record in records {
        println!("  {}", record.summary(tz));
    }
}
