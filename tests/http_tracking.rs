use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sparrow_tracker::{
    BookingType, NotificationType, TrackerError,
    services::{
        booking_tracker::BookingTracker,
        notification_service::NotificationStore,
        status_client::{BackendConfig, BookingStatusSource, HttpBookingStatusClient},
        storage::MemoryStore,
    },
};

fn tracker_for(server: &MockServer) -> (Arc<BookingTracker>, Arc<NotificationStore>) {
    let store = Arc::new(MemoryStore::new());
    let client = HttpBookingStatusClient::new(BackendConfig::new(server.uri())).unwrap();
    let notifications = Arc::new(NotificationStore::new(store.clone()));
    let tracker = Arc::new(BookingTracker::new(store, Arc::new(client), notifications.clone()));
    (tracker, notifications)
}

#[tokio::test]
async fn test_driver_assigned_ride_notifies_customer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/corporate/bookings/42/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 42, "status": "driver_assigned" })))
        .expect(1)
        .mount(&server)
        .await;

    let (tracker, notifications) = tracker_for(&server);
    tracker
        .track_booking("cust1", 42, "pending", BookingType::Ride, Some(json!({ "rideType": "standard" })))
        .await
        .unwrap();

    let report = tracker.check_booking_status_changes().await;

    assert_eq!(report.notified, 1);
    assert!(tracker.tracked_bookings().await.is_empty());

    let entries = notifications.notifications("cust1").await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title, "Ride Confirmed! 🚗");
    assert_eq!(entries[0].notification_type, NotificationType::Ride);
    assert_eq!(notifications.unread_count("cust1").await, 1);
}

#[tokio::test]
async fn test_service_bookings_use_service_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/corporate/service-bookings/7/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "cancelled" })))
        .expect(1)
        .mount(&server)
        .await;

    let (tracker, notifications) = tracker_for(&server);
    tracker.track_booking("cust2", 7, "pending", BookingType::Service, None).await.unwrap();

    let report = tracker.check_booking_status_changes().await;

    assert_eq!(report.removed, 1);
    assert_eq!(report.notified, 0);
    assert_eq!(notifications.unread_count("cust2").await, 0);
}

#[tokio::test]
async fn test_server_error_keeps_booking_for_next_tick() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/corporate/bookings/3/"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let (tracker, _) = tracker_for(&server);
    tracker.track_booking("cust3", 3, "pending", BookingType::Ride, None).await.unwrap();

    let report = tracker.check_booking_status_changes().await;

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].booking_id, Some(3));
    assert_eq!(tracker.tracked_bookings().await.len(), 1);
}

#[tokio::test]
async fn test_client_reports_missing_status_and_bad_responses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/corporate/bookings/1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1 })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/corporate/bookings/2/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = HttpBookingStatusClient::new(BackendConfig::new(server.uri())).unwrap();

    assert_eq!(client.fetch_status(1, BookingType::Ride).await.unwrap(), None);
    assert!(matches!(
        client.fetch_status(2, BookingType::Ride).await,
        Err(TrackerError::UnexpectedStatus { booking_id: 2, status: 404 })
    ));
}

#[tokio::test]
async fn test_client_sends_auth_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/corporate/bookings/5/"))
        .and(header("Authorization", "Token secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "pending" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = BackendConfig::new(server.uri());
    config.auth_token = Some("secret".to_string());
    let client = HttpBookingStatusClient::new(config).unwrap();

    assert_eq!(client.fetch_status(5, BookingType::Ride).await.unwrap().as_deref(), Some("pending"));
}
