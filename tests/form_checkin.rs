mod common;

use std::sync::Arc;

use common::{FakeAttendanceService, FixedResolver, OFFICE_IP, entry, rejected, transport_failure};
use presence_checkin::client::attendance::models::AttendanceModels::{AttendanceEntry, ServiceReply};
use reqwest::StatusCode;
use tokio::sync::Notify;

use presence_checkin::checkin::error::CheckinError;
use presence_checkin::checkin::form::FormCapture;
use presence_checkin::checkin::form_checkin::{FORM_FAILURE_MESSAGE, FormCheckin};
use presence_checkin::checkin::history::{EventType, SubmissionStatus};
use presence_checkin::checkin::origin::{OriginGate, OriginState};
use presence_checkin::checkin::state::SubmissionState;
use presence_checkin::checkin::validation::NameField;
use presence_checkin::client::error::ApiError;

fn checkin_at(service: Arc<FakeAttendanceService>, origin: OriginState) -> FormCheckin {
    let checkin = FormCheckin::new(service, OriginGate::new(OFFICE_IP));
    checkin.set_origin(origin);
    checkin
}

fn at_office() -> OriginState {
    OriginState::Resolved(OFFICE_IP.to_string())
}

#[tokio::test]
async fn accepted_form_resets_fields_and_event_type() {
    let service = Arc::new(FakeAttendanceService::new());
    let checkin = checkin_at(service.clone(), at_office());
    checkin.set_first_name("Jean-Paul");
    checkin.set_last_name(" O'Neil ");
    checkin.set_event_type(EventType::Departure);

    let outcome = checkin.submit().await.unwrap();

    assert!(outcome.is_success());
    assert_eq!(checkin.form(), FormCapture::default());
    assert_eq!(checkin.form().event_type, EventType::Arrival);

    let requests = service.attendance_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].first_name, "Jean-Paul");
    assert_eq!(requests[0].last_name, "O'Neil");
    assert_eq!(requests[0].event_type, EventType::Departure);

    let recent = checkin.recent();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id, "srv-1");
    assert_eq!(recent[0].status, SubmissionStatus::Success);
    assert_eq!(recent[0].event_type, EventType::Departure);
    assert_eq!(recent[0].display_name.as_deref(), Some("Jean-Paul O'Neil"));
    assert!(matches!(checkin.state(), SubmissionState::Succeeded(_)));
}

#[tokio::test]
async fn unresolved_origin_blocks_without_any_request() {
    let service = Arc::new(FakeAttendanceService::new());
    let checkin = checkin_at(service.clone(), OriginState::Pending);
    checkin.fill(FormCapture::new("Jean-Paul", "O'Neil", EventType::Arrival));

    assert_eq!(checkin.submit().await, Err(CheckinError::OriginPending));

    assert!(service.attendance_requests().is_empty());
    assert_eq!(checkin.state(), SubmissionState::Idle);
    assert_eq!(checkin.history_len(), 0);
    assert_eq!(checkin.form().first_name, "Jean-Paul");
}

#[tokio::test]
async fn failed_lookup_blocks_with_its_own_message() {
    let service = Arc::new(FakeAttendanceService::new());
    let checkin = checkin_at(service.clone(), OriginState::Pending);
    checkin.fill(FormCapture::new("Awa", "Dossou", EventType::Arrival));

    let origin = checkin.resolve_origin(&FixedResolver(Err("dns failure".to_string()))).await;
    assert!(matches!(origin, OriginState::Unavailable(_)));

    let err = checkin.submit().await.unwrap_err();
    assert!(matches!(err, CheckinError::OriginUnavailable(ref reason) if reason.contains("dns failure")));
    assert_ne!(err.to_string(), CheckinError::OriginPending.to_string());
    assert!(service.attendance_requests().is_empty());
}

#[tokio::test]
async fn foreign_network_is_rejected_and_unlocked() {
    let service = Arc::new(FakeAttendanceService::new());
    let checkin = checkin_at(service.clone(), OriginState::Pending);
    checkin.resolve_origin(&FixedResolver(Ok("41.85.160.3".to_string()))).await;
    checkin.fill(FormCapture::new("Awa", "Dossou", EventType::Arrival));

    assert_eq!(
        checkin.submit().await,
        Err(CheckinError::OriginRejected { resolved: "41.85.160.3".to_string() })
    );

    assert!(service.attendance_requests().is_empty());
    assert_eq!(checkin.history_len(), 0);
    assert!(!checkin.is_submitting());
    assert_eq!(checkin.state(), SubmissionState::Idle);
}

#[tokio::test]
async fn invalid_names_are_caught_before_the_gate() {
    let service = Arc::new(FakeAttendanceService::new());
    let checkin = checkin_at(service.clone(), OriginState::Pending);

    checkin.fill(FormCapture::new("J3an", "O'Neil", EventType::Arrival));
    assert_eq!(checkin.submit().await, Err(CheckinError::InvalidName(NameField::FirstName)));

    checkin.set_origin(at_office());
    checkin.fill(FormCapture::new("Jean", "   ", EventType::Arrival));
    assert_eq!(checkin.submit().await, Err(CheckinError::InvalidName(NameField::LastName)));

    assert!(service.attendance_requests().is_empty());
    assert_eq!(checkin.history_len(), 0);
}

#[tokio::test]
async fn service_rejection_records_error_and_keeps_fields() {
    let service = Arc::new(FakeAttendanceService::new());
    service.push_attendance(Ok(rejected(StatusCode::CONFLICT, Some("already checked in"))));
    let checkin = checkin_at(service, at_office());
    checkin.fill(FormCapture::new("Awa", "Dossou", EventType::Departure));

    let outcome = checkin.submit().await.unwrap();

    assert_eq!(outcome.status, SubmissionStatus::Error);
    assert_eq!(outcome.message.as_deref(), Some("already checked in"));
    let recent = checkin.recent();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].status, SubmissionStatus::Error);
    assert_eq!(recent[0].display_name.as_deref(), Some("Awa Dossou"));
    assert_eq!(checkin.form(), FormCapture::new("Awa", "Dossou", EventType::Departure));
    assert_eq!(checkin.state(), SubmissionState::Failed("already checked in".to_string()));
}

#[tokio::test]
async fn transport_failure_adds_no_record() {
    let service = Arc::new(FakeAttendanceService::new());
    service.push_attendance(Err(transport_failure()));
    let checkin = checkin_at(service, at_office());
    checkin.fill(FormCapture::new("Awa", "Dossou", EventType::Arrival));

    let outcome = checkin.submit().await.unwrap();

    assert_eq!(outcome.status, SubmissionStatus::Error);
    assert_eq!(outcome.message.as_deref(), Some(FORM_FAILURE_MESSAGE));
    assert!(outcome.record.is_none());
    assert_eq!(checkin.history_len(), 0);
    assert!(!checkin.is_submitting());
    assert_eq!(checkin.form().last_name, "Dossou");
}

#[tokio::test]
async fn todays_entries_seed_the_history() {
    let service = Arc::new(FakeAttendanceService::new());
    service.set_today(Ok(vec![
        entry("t2", "Awa", "Dossou", EventType::Departure),
        entry("t1", "Koffi", "Agbo", EventType::Arrival),
    ]));
    let checkin = checkin_at(service, at_office());

    assert_eq!(checkin.load_today().await.unwrap(), 2);

    checkin.fill(FormCapture::new("Jean-Paul", "O'Neil", EventType::Arrival));
    checkin.submit().await.unwrap();

    let ids: Vec<_> = checkin.recent().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, ["srv-1", "t2", "t1"]);
}

#[tokio::test]
async fn failed_history_load_is_reported() {
    let service = Arc::new(FakeAttendanceService::new());
    service.set_today(Err(ApiError::Status(StatusCode::SERVICE_UNAVAILABLE)));
    let checkin = checkin_at(service, at_office());

    assert!(checkin.load_today().await.is_err());
    assert_eq!(checkin.history_len(), 0);
}

#[tokio::test]
async fn accepted_reply_without_readable_body_uses_local_record() {
    let service = Arc::new(FakeAttendanceService::new());
    service.push_attendance(Ok(ServiceReply { status: StatusCode::CREATED, body: None, message: None }));
    let checkin = checkin_at(service, at_office());
    checkin.fill(FormCapture::new("Jean-Paul", "O'Neil", EventType::Departure));

    let outcome = checkin.submit().await.unwrap();

    assert!(outcome.is_success());
    let recent = checkin.recent();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].status, SubmissionStatus::Success);
    assert_eq!(recent[0].event_type, EventType::Departure);
    assert_eq!(recent[0].display_name.as_deref(), Some("Jean-Paul O'Neil"));
    assert_eq!(checkin.form(), FormCapture::default());
}

#[tokio::test]
async fn sparse_reply_body_is_completed_from_the_form() {
    let service = Arc::new(FakeAttendanceService::new());
    let body = AttendanceEntry { id: Some("a1".to_string()), ..AttendanceEntry::default() };
    service.push_attendance(Ok(ServiceReply { status: StatusCode::OK, body: Some(body), message: None }));
    let checkin = checkin_at(service, at_office());
    checkin.fill(FormCapture::new("Awa", "Dossou", EventType::Departure));

    checkin.submit().await.unwrap();

    let recent = checkin.recent();
    assert_eq!(recent[0].id, "a1");
    assert_eq!(recent[0].event_type, EventType::Departure);
    assert_eq!(recent[0].display_name.as_deref(), Some("Awa Dossou"));
}

#[tokio::test]
async fn second_form_submit_while_in_flight_is_refused() {
    let release = Arc::new(Notify::new());
    let service = Arc::new(FakeAttendanceService::held(release.clone()));
    let checkin = checkin_at(service.clone(), at_office());
    checkin.fill(FormCapture::new("Awa", "Dossou", EventType::Arrival));

    let (first, second, _) = tokio::join!(checkin.submit(), checkin.submit(), async {
        release.notify_one();
    });

    assert!(first.unwrap().is_success());
    assert_eq!(second, Err(CheckinError::AlreadySubmitting));
    assert_eq!(service.attendance_requests().len(), 1);
    assert_eq!(checkin.history_len(), 1);
    assert!(!checkin.is_submitting());
}
