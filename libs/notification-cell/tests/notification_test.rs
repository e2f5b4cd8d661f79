use assert_matches::assert_matches;
use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use notification_cell::models::NotificationError;
use notification_cell::services::notification::NotificationService;
use shared_utils::test_utils::TestConfig;

fn notification_row(id: i64, user_id: i64, message: &str) -> serde_json::Value {
    json!({
        "id": id,
        "user_id": user_id,
        "message": message,
        "is_read": false,
        "created_at": "2024-06-01T08:00:00Z"
    })
}

async fn mount_insert(server: &MockServer, user_id: i64, message_fragment: &str) {
    Mock::given(method("POST"))
        .and(path("/rest/v1/notifications"))
        .and(body_partial_json(json!({ "user_id": user_id })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([notification_row(1, user_id, message_fragment)])),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn patient_booking_notifies_doctor_and_admin() {
    let mock_server = MockServer::start().await;
    mount_insert(&mock_server, 7, "requested").await;
    mount_insert(&mock_server, 1, "created").await;

    let config = TestConfig::with_storage_url(&mock_server.uri());
    let service = NotificationService::new(&config);

    service
        .appointment_booked("patient", 7, 3, NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(), 1)
        .await
        .unwrap();
}

#[tokio::test]
async fn doctor_booking_notifies_patient_and_admin() {
    let mock_server = MockServer::start().await;
    mount_insert(&mock_server, 3, "doctor").await;
    mount_insert(&mock_server, 1, "created").await;

    let config = TestConfig::with_storage_url(&mock_server.uri());
    let service = NotificationService::new(&config);

    service
        .appointment_booked("doctor", 7, 3, NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(), 1)
        .await
        .unwrap();
}

#[tokio::test]
async fn admin_booking_notifies_both_parties() {
    let mock_server = MockServer::start().await;
    mount_insert(&mock_server, 7, "scheduled for you").await;
    mount_insert(&mock_server, 3, "your appointment").await;

    let config = TestConfig::with_storage_url(&mock_server.uri());
    let service = NotificationService::new(&config);

    service
        .appointment_booked("admin", 7, 3, NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(), 1)
        .await
        .unwrap();
}

#[tokio::test]
async fn listing_returns_rows_newest_first() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/notifications"))
        .and(query_param("user_id", "eq.3"))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            notification_row(2, 3, "newer"),
            notification_row(1, 3, "older")
        ])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_storage_url(&mock_server.uri());
    let service = NotificationService::new(&config);

    let notifications = service.list_for_user(3).await.unwrap();
    assert_eq!(notifications.len(), 2);
    assert_eq!(notifications[0].message, "newer");
}

#[tokio::test]
async fn marking_a_missing_notification_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/notifications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_storage_url(&mock_server.uri());
    let service = NotificationService::new(&config);

    let result = service.mark_read(999).await;
    assert_matches!(result, Err(NotificationError::NotFound));
}
