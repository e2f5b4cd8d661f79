use assert_matches::assert_matches;
use axum::extract::{Query, State};
use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::handlers::{get_available_slots, SlotQueryParams};
use appointment_cell::services::slots::SlotService;
use shared_models::error::AppError;
use shared_utils::test_utils::TestConfig;

fn june_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

async fn mount_doctor_without_window(server: &MockServer, doctor_id: i64) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "available_from": null, "available_to": null }
        ])))
        .mount(server)
        .await;
}

async fn mount_booked_times(server: &MockServer, doctor_id: i64, times: &[&str]) {
    let rows: Vec<_> = times
        .iter()
        .map(|t| json!({ "appointment_time": t }))
        .collect();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .and(query_param("select", "appointment_time"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(rows)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn booked_slot_moves_from_available_to_booked() {
    let mock_server = MockServer::start().await;
    mount_doctor_without_window(&mock_server, 5).await;
    mount_booked_times(&mock_server, 5, &["09:30:00"]).await;

    let config = TestConfig::with_storage_url(&mock_server.uri());
    let service = SlotService::new(&config);

    let availability = service.list_slots(5, june_first()).await.unwrap();

    assert!(availability.booked_slots.contains(&"09:30".to_string()));
    assert!(!availability.available_slots.contains(&"09:30".to_string()));
    assert!(availability.available_slots.contains(&"09:00".to_string()));
    assert!(availability.available_slots.contains(&"10:00".to_string()));
}

#[tokio::test]
async fn booked_and_available_partition_the_grid() {
    let mock_server = MockServer::start().await;
    mount_doctor_without_window(&mock_server, 5).await;
    mount_booked_times(&mock_server, 5, &["09:00:00", "14:30:00", "17:00:00"]).await;

    let config = TestConfig::with_storage_url(&mock_server.uri());
    let service = SlotService::new(&config);

    let availability = service.list_slots(5, june_first()).await.unwrap();

    // Union equals the candidate grid, in grid order.
    let mut union: Vec<String> = availability
        .all_slots
        .iter()
        .filter(|slot| availability.booked_slots.contains(slot))
        .chain(
            availability
                .all_slots
                .iter()
                .filter(|slot| availability.available_slots.contains(slot)),
        )
        .cloned()
        .collect();
    union.sort();
    let mut all = availability.all_slots.clone();
    all.sort();
    assert_eq!(union, all);

    // And the two sides are disjoint.
    for slot in &availability.booked_slots {
        assert!(!availability.available_slots.contains(slot));
    }
    assert_eq!(
        availability.booked_slots.len() + availability.available_slots.len(),
        availability.all_slots.len()
    );
}

#[tokio::test]
async fn default_grid_has_morning_and_afternoon_blocks() {
    let mock_server = MockServer::start().await;
    mount_doctor_without_window(&mock_server, 9).await;
    mount_booked_times(&mock_server, 9, &[]).await;

    let config = TestConfig::with_storage_url(&mock_server.uri());
    let service = SlotService::new(&config);

    let availability = service.list_slots(9, june_first()).await.unwrap();

    assert_eq!(
        availability.all_slots,
        vec![
            "09:00", "09:30", "10:00", "10:30", "11:00", "11:30", "14:00", "14:30", "15:00",
            "15:30", "16:00", "16:30", "17:00"
        ]
    );
    assert_eq!(availability.available_slots, availability.all_slots);
    assert!(availability.booked_slots.is_empty());
}

#[tokio::test]
async fn doctor_window_overrides_the_default_grid() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("doctor_id", "eq.11"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "available_from": "10:00:00", "available_to": "12:00:00" }
        ])))
        .mount(&mock_server)
        .await;
    mount_booked_times(&mock_server, 11, &["10:30:00"]).await;

    let config = TestConfig::with_storage_url(&mock_server.uri());
    let service = SlotService::new(&config);

    let availability = service.list_slots(11, june_first()).await.unwrap();

    assert_eq!(availability.all_slots, vec!["10:00", "10:30", "11:00", "11:30", "12:00"]);
    assert_eq!(availability.booked_slots, vec!["10:30"]);
    assert_eq!(availability.available_slots, vec!["10:00", "11:00", "11:30", "12:00"]);
}

#[tokio::test]
async fn listing_is_idempotent_without_intervening_bookings() {
    let mock_server = MockServer::start().await;
    mount_doctor_without_window(&mock_server, 5).await;
    mount_booked_times(&mock_server, 5, &["11:00:00"]).await;

    let config = TestConfig::with_storage_url(&mock_server.uri());
    let service = SlotService::new(&config);

    let first = service.list_slots(5, june_first()).await.unwrap();
    let second = service.list_slots(5, june_first()).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn stored_times_outside_the_grid_are_ignored() {
    let mock_server = MockServer::start().await;
    mount_doctor_without_window(&mock_server, 5).await;
    // 08:15 is not a candidate slot; it must not leak into either list.
    mount_booked_times(&mock_server, 5, &["08:15:00", "09:00:00"]).await;

    let config = TestConfig::with_storage_url(&mock_server.uri());
    let service = SlotService::new(&config);

    let availability = service.list_slots(5, june_first()).await.unwrap();

    assert_eq!(availability.booked_slots, vec!["09:00"]);
    assert!(!availability.available_slots.contains(&"08:15".to_string()));
    assert_eq!(
        availability.booked_slots.len() + availability.available_slots.len(),
        availability.all_slots.len()
    );
}

#[tokio::test]
async fn listing_without_a_date_is_a_client_error() {
    let config = TestConfig::default().to_arc();

    let result = get_available_slots(
        State(config.clone()),
        Query(SlotQueryParams {
            doctor_id: Some(5),
            date: None,
        }),
    )
    .await;
    assert_matches!(result, Err(AppError::BadRequest(_)));

    let result = get_available_slots(
        State(config),
        Query(SlotQueryParams {
            doctor_id: None,
            date: Some(june_first()),
        }),
    )
    .await;
    assert_matches!(result, Err(AppError::BadRequest(_)));
}

#[tokio::test]
async fn unknown_doctor_falls_back_to_the_default_grid() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    mount_booked_times(&mock_server, 404, &[]).await;

    let config = TestConfig::with_storage_url(&mock_server.uri());
    let service = SlotService::new(&config);

    let availability = service.list_slots(404, june_first()).await.unwrap();
    assert_eq!(availability.all_slots.len(), 13);
}
