use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::models::{
    AppointmentError, AppointmentStatus, BookSlotRequest, ChangeStatusRequest,
    CreateAppointmentRequest,
};
use appointment_cell::services::booking::BookingService;
use shared_utils::test_utils::{TestAccount, TestConfig};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn book_request(doctor_id: i64, d: Option<NaiveDate>, t: Option<NaiveTime>) -> BookSlotRequest {
    BookSlotRequest {
        doctor_id,
        patient_id: None,
        appointment_date: d,
        appointment_time: t,
        duration_minutes: None,
        appointment_type: None,
        status: None,
        reason_for_visit: None,
        notes: None,
    }
}

fn appointment_row(id: i64, patient_id: i64, doctor_id: i64, d: &str, t: &str) -> Value {
    json!({
        "appointment_id": id,
        "patient_id": patient_id,
        "doctor_id": doctor_id,
        "appointment_date": d,
        "appointment_time": t,
        "duration_minutes": 30,
        "appointment_type": "consultation",
        "status": "scheduled",
        "reason_for_visit": null,
        "notes": null,
        "created_at": "2024-06-01T08:00:00Z"
    })
}

/// The patient-day conflict check: filters on patient_id + date.
async fn mount_day_check(server: &MockServer, patient_id: i64, rows: Value) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("patient_id", format!("eq.{}", patient_id)))
        .and(query_param("select", "appointment_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .mount(server)
        .await;
}

/// The slot conflict check: filters on appointment_time.
async fn mount_slot_check(server: &MockServer, slot_time: &str, rows: Value) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("appointment_time", format!("eq.{}", slot_time)))
        .and(query_param("select", "appointment_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .mount(server)
        .await;
}

async fn mount_notifications(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/rest/v1/notifications"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            { "id": 1, "user_id": 1, "message": "x", "is_read": false, "created_at": "2024-06-01T08:00:00Z" }
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn patient_books_a_free_slot() {
    let mock_server = MockServer::start().await;

    mount_day_check(&mock_server, 3, json!([])).await;
    mount_slot_check(&mock_server, "09:00:00", json!([])).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .and(body_partial_json(json!({
            "patient_id": 3,
            "doctor_id": 7,
            "appointment_time": "09:00:00",
            "status": "scheduled"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            appointment_row(101, 3, 7, "2024-06-10", "09:00:00")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_notifications(&mock_server).await;

    let config = TestConfig::with_storage_url(&mock_server.uri());
    let service = BookingService::new(&config);
    let caller = TestAccount::patient(3);

    let appointment = service
        .book_slot(&caller, book_request(7, Some(date(2024, 6, 10)), Some(time(9, 0))))
        .await
        .unwrap();

    assert_eq!(appointment.appointment_id, 101);
    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
}

#[tokio::test]
async fn second_booking_for_the_same_slot_conflicts() {
    let mock_server = MockServer::start().await;

    // Patients 3 and 4 both have a clear day with this doctor.
    mount_day_check(&mock_server, 3, json!([])).await;
    mount_day_check(&mock_server, 4, json!([])).await;

    // The slot is free exactly once.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("appointment_time", "eq.09:00:00"))
        .and(query_param("select", "appointment_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_slot_check(
        &mock_server,
        "09:00:00",
        json!([{ "appointment_id": 101 }]),
    )
    .await;

    // Exactly one row may be inserted.
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            appointment_row(101, 3, 5, "2024-06-01", "09:00:00")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_notifications(&mock_server).await;

    let config = TestConfig::with_storage_url(&mock_server.uri());
    let service = BookingService::new(&config);

    let first = service
        .book_slot(
            &TestAccount::patient(3),
            book_request(5, Some(date(2024, 6, 1)), Some(time(9, 0))),
        )
        .await;
    assert!(first.is_ok());

    let second = service
        .book_slot(
            &TestAccount::patient(4),
            book_request(5, Some(date(2024, 6, 1)), Some(time(9, 0))),
        )
        .await;
    assert_matches!(second, Err(AppointmentError::SlotTaken));
}

#[tokio::test]
async fn same_day_same_doctor_is_rejected_even_at_another_time() {
    let mock_server = MockServer::start().await;

    // Patient 3 already has a 09:00 appointment with doctor 7 that day.
    mount_day_check(&mock_server, 3, json!([{ "appointment_id": 55 }])).await;

    let config = TestConfig::with_storage_url(&mock_server.uri());
    let service = BookingService::new(&config);

    let result = service
        .book_slot(
            &TestAccount::patient(3),
            book_request(7, Some(date(2024, 6, 10)), Some(time(14, 0))),
        )
        .await;

    assert_matches!(result, Err(AppointmentError::DuplicateForDay));
}

#[tokio::test]
async fn booking_without_date_or_time_is_a_validation_error() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_storage_url(&mock_server.uri());
    let service = BookingService::new(&config);
    let caller = TestAccount::patient(3);

    let missing_time = service
        .book_slot(&caller, book_request(7, Some(date(2024, 6, 10)), None))
        .await;
    assert_matches!(missing_time, Err(AppointmentError::Validation(_)));

    let missing_date = service
        .book_slot(&caller, book_request(7, None, Some(time(9, 0))))
        .await;
    assert_matches!(missing_date, Err(AppointmentError::Validation(_)));
}

#[tokio::test]
async fn patient_without_linked_record_cannot_book() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_storage_url(&mock_server.uri());
    let service = BookingService::new(&config);

    let mut caller = TestAccount::patient(3);
    caller.linked_patient_id = None;

    let result = service
        .book_slot(&caller, book_request(7, Some(date(2024, 6, 10)), Some(time(9, 0))))
        .await;

    assert_matches!(result, Err(AppointmentError::NoLinkedPatient));
}

#[tokio::test]
async fn staff_booking_requires_an_explicit_patient() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_storage_url(&mock_server.uri());
    let service = BookingService::new(&config);

    let result = service
        .book_slot(
            &TestAccount::admin(),
            book_request(7, Some(date(2024, 6, 10)), Some(time(9, 0))),
        )
        .await;

    assert_matches!(result, Err(AppointmentError::Validation(_)));
}

#[tokio::test]
async fn storage_conflict_on_insert_reads_as_slot_taken() {
    let mock_server = MockServer::start().await;

    mount_day_check(&mock_server, 3, json!([])).await;
    mount_slot_check(&mock_server, "09:00:00", json!([])).await;
    // The unique index fires after both pre-checks passed (lost race).
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "duplicate key value violates unique constraint \"appointments_slot_unique\""
        })))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_storage_url(&mock_server.uri());
    let service = BookingService::new(&config);

    let result = service
        .book_slot(
            &TestAccount::patient(3),
            book_request(7, Some(date(2024, 6, 10)), Some(time(9, 0))),
        )
        .await;

    assert_matches!(result, Err(AppointmentError::SlotTaken));
}

#[tokio::test]
async fn admin_create_fans_out_to_doctor_and_patient() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            appointment_row(201, 3, 7, "2024-06-10", "10:00:00")
        ])))
        .mount(&mock_server)
        .await;

    // One notification for the doctor, one for the patient.
    Mock::given(method("POST"))
        .and(path("/rest/v1/notifications"))
        .and(body_partial_json(json!({ "user_id": 7 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            { "id": 1, "user_id": 7, "message": "x", "is_read": false, "created_at": "2024-06-01T08:00:00Z" }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/notifications"))
        .and(body_partial_json(json!({ "user_id": 3 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            { "id": 2, "user_id": 3, "message": "x", "is_read": false, "created_at": "2024-06-01T08:00:00Z" }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_storage_url(&mock_server.uri());
    let service = BookingService::new(&config);

    let request = CreateAppointmentRequest {
        patient_id: 3,
        doctor_id: 7,
        appointment_date: Some(date(2024, 6, 10)),
        appointment_time: Some(time(10, 0)),
        duration_minutes: Some(30),
        appointment_type: Some("consultation".to_string()),
        status: None,
        reason_for_visit: None,
        notes: None,
    };

    let appointment = service
        .create_appointment(&TestAccount::admin(), request)
        .await
        .unwrap();
    assert_eq!(appointment.appointment_id, 201);
}

#[tokio::test]
async fn failed_fan_out_does_not_fail_the_booking() {
    let mock_server = MockServer::start().await;

    mount_day_check(&mock_server, 3, json!([])).await;
    mount_slot_check(&mock_server, "09:00:00", json!([])).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            appointment_row(301, 3, 7, "2024-06-10", "09:00:00")
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/notifications"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "boom" })))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_storage_url(&mock_server.uri());
    let service = BookingService::new(&config);

    let result = service
        .book_slot(
            &TestAccount::patient(3),
            book_request(7, Some(date(2024, 6, 10)), Some(time(9, 0))),
        )
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn change_status_normalizes_and_updates() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("appointment_id", "eq.42"))
        .and(body_partial_json(json!({ "status": "completed" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            appointment_row(42, 3, 7, "2024-06-10", "09:00:00")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_storage_url(&mock_server.uri());
    let service = BookingService::new(&config);

    let status = service
        .change_status(42, ChangeStatusRequest { status: "COMPLETED".to_string() })
        .await
        .unwrap();

    assert_eq!(status, AppointmentStatus::Completed);
}

#[tokio::test]
async fn unknown_status_is_rejected_before_any_write() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_storage_url(&mock_server.uri());
    let service = BookingService::new(&config);

    let result = service
        .change_status(42, ChangeStatusRequest { status: "archived".to_string() })
        .await;

    assert_matches!(result, Err(AppointmentError::InvalidStatus(_)));
    // No PATCH was mounted; reaching storage would have errored the call
    // differently, so the match above also proves nothing was written.
}

#[tokio::test]
async fn change_status_on_missing_appointment_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_storage_url(&mock_server.uri());
    let service = BookingService::new(&config);

    let result = service
        .change_status(999_999, ChangeStatusRequest { status: "cancelled".to_string() })
        .await;

    assert_matches!(result, Err(AppointmentError::NotFound));
}

#[tokio::test]
async fn deleting_a_missing_appointment_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("appointment_id", "eq.999999"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_storage_url(&mock_server.uri());
    let service = BookingService::new(&config);

    let result = service.delete_appointment(999_999).await;
    assert_matches!(result, Err(AppointmentError::NotFound));
}
