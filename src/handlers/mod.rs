pub mod booking_handler;
pub mod notification_handler;

use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/bookings/track", post(booking_handler::track_booking))
        .route("/bookings/tracked", get(booking_handler::tracked_bookings))
        .route("/bookings/poll", post(booking_handler::poll_now))
        .route("/bookings/:booking_id", delete(booking_handler::untrack_booking))
        .route(
            "/customers/:customer_id/notifications",
            get(notification_handler::list_notifications).delete(notification_handler::clear_notifications),
        )
        .route(
            "/customers/:customer_id/notifications/unread-count",
            get(notification_handler::unread_count),
        )
        .route(
            "/customers/:customer_id/notifications/read-all",
            post(notification_handler::mark_all_read),
        )
        .route(
            "/customers/:customer_id/notifications/:notification_id/read",
            post(notification_handler::mark_read),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
