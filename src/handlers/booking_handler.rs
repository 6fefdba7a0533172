// src/handlers/booking_handler.rs
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::{
    errors::{TrackerError, TrackerResult},
    models::booking::{TrackBookingRequest, TrackedBooking},
    services::booking_tracker::PollReport,
    state::AppState,
};

pub async fn track_booking(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TrackBookingRequest>,
) -> TrackerResult<(StatusCode, Json<Value>)> {
    if request.customer_id.trim().is_empty() {
        return Err(TrackerError::bad_request("customerId must not be empty"));
    }

    let tracked = state
        .booking_tracker
        .track_booking(
            &request.customer_id,
            request.booking_id,
            &request.status,
            request.booking_type,
            request.details,
        )
        .await?;

    let status = if tracked { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(json!({ "bookingId": request.booking_id, "tracked": tracked }))))
}

pub async fn untrack_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<i64>,
) -> TrackerResult<StatusCode> {
    if state.booking_tracker.untrack_booking(booking_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(TrackerError::not_found(format!("booking {} is not tracked", booking_id)))
    }
}

pub async fn tracked_bookings(State(state): State<Arc<AppState>>) -> Json<Vec<TrackedBooking>> {
    Json(state.booking_tracker.tracked_bookings().await)
}

/// Run one reconciliation pass right away, outside the timer.
pub async fn poll_now(State(state): State<Arc<AppState>>) -> Json<PollReport> {
    Json(state.booking_tracker.check_booking_status_changes().await)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::{
        errors::TrackerError,
        handlers::router,
        models::booking::BookingType,
        services::{status_client::BookingStatusSource, storage::MemoryStore},
        state::{AppConfig, AppState},
    };

    struct ConfirmingSource;

    #[async_trait]
    impl BookingStatusSource for ConfirmingSource {
        async fn fetch_status(&self, _booking_id: i64, _booking_type: BookingType) -> Result<Option<String>, TrackerError> {
            Ok(Some("confirmed".to_string()))
        }
    }

    fn app() -> (Router, Arc<AppState>) {
        let config = AppConfig::from_lookup(|key| (key == "BACKEND_URL").then(|| "http://backend.test".to_string())).unwrap();
        let state = Arc::new(AppState::with_components(Arc::new(MemoryStore::new()), Arc::new(ConfirmingSource), config));
        (router(state.clone()), state)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_track_rejects_empty_customer() {
        let (app, _) = app();
        let request = post_json(
            "/bookings/track",
            json!({ "customerId": " ", "bookingId": 1, "status": "pending", "type": "ride" }),
        );

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_track_then_poll_returns_report() {
        let (app, state) = app();

        let response = app
            .clone()
            .oneshot(post_json(
                "/bookings/track",
                json!({ "customerId": "cust1", "bookingId": 42, "status": "pending", "type": "ride" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["tracked"], true);

        let response = app.oneshot(post_json("/bookings/poll", json!({}))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let report = body_json(response).await;
        assert_eq!(report["checked"], 1);
        assert_eq!(report["notified"], 1);
        assert_eq!(report["removed"], 1);
        assert!(report["failures"].as_array().unwrap().is_empty());
        assert_eq!(state.notification_store.unread_count("cust1").await, 1);
    }

    #[tokio::test]
    async fn test_untrack_unknown_booking_is_not_found() {
        let (app, _) = app();
        let request = Request::builder()
            .method("DELETE")
            .uri("/bookings/99")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
