// src/handlers/notification_handler.rs
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::{
    errors::{TrackerError, TrackerResult},
    models::notification::Notification,
    state::AppState,
};

pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
) -> Json<Vec<Notification>> {
    Json(state.notification_store.notifications(&customer_id).await)
}

pub async fn unread_count(State(state): State<Arc<AppState>>, Path(customer_id): Path<String>) -> Json<Value> {
    let count = state.notification_store.unread_count(&customer_id).await;
    Json(json!({ "customerId": customer_id, "unread": count }))
}

pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Path((customer_id, notification_id)): Path<(String, String)>,
) -> TrackerResult<StatusCode> {
    if state.notification_store.mark_read(&customer_id, &notification_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(TrackerError::not_found(format!("notification {}", notification_id)))
    }
}

pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
) -> TrackerResult<Json<Value>> {
    let changed = state.notification_store.mark_all_read(&customer_id).await?;
    Ok(Json(json!({ "customerId": customer_id, "marked": changed })))
}

pub async fn clear_notifications(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
) -> TrackerResult<StatusCode> {
    state.notification_store.clear(&customer_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
