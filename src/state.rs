// src/state.rs
use std::sync::Arc;
use std::time::Duration;

use crate::{
    errors::{TrackerError, TrackerResult},
    services::{
        booking_tracker::BookingTracker,
        notification_service::NotificationStore,
        poller::BookingStatusPoller,
        status_client::{BackendConfig, BookingStatusSource, HttpBookingStatusClient},
        storage::{KeyValueStore, MemoryStore, RedisStore},
    },
};

pub struct AppState {
    pub notification_store: Arc<NotificationStore>,
    pub booking_tracker: Arc<BookingTracker>,
    pub poller: BookingStatusPoller,
    pub config: AppConfig,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub backend_url: String,
    pub backend_auth_token: Option<String>,
    pub backend_timeout: Option<Duration>,
    pub redis_url: Option<String>,
    pub bind_addr: String,
}

impl AppConfig {
    pub fn from_env() -> TrackerResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> TrackerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let backend_url = non_empty("BACKEND_URL")
            .ok_or_else(|| TrackerError::MissingEnvironmentVariable("BACKEND_URL".to_string()))?;

        let backend_timeout = match non_empty("BACKEND_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|_| {
                    TrackerError::InvalidConfiguration(format!("BACKEND_TIMEOUT_SECS must be an integer, got '{}'", raw))
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            backend_url,
            backend_auth_token: non_empty("BACKEND_AUTH_TOKEN"),
            backend_timeout,
            redis_url: non_empty("REDIS_URL"),
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
        })
    }

    pub fn backend(&self) -> BackendConfig {
        BackendConfig {
            base_url: self.backend_url.clone(),
            auth_token: self.backend_auth_token.clone(),
            timeout: self.backend_timeout,
        }
    }
}

impl AppState {
    pub async fn new(config: AppConfig) -> TrackerResult<Self> {
        let store: Arc<dyn KeyValueStore> = match &config.redis_url {
            Some(url) => Arc::new(RedisStore::new(url).await?),
            None => {
                tracing::warn!("REDIS_URL not set, using in-memory store");
                Arc::new(MemoryStore::new())
            }
        };
        let status_source: Arc<dyn BookingStatusSource> = Arc::new(HttpBookingStatusClient::new(config.backend())?);

        Ok(Self::with_components(store, status_source, config))
    }

    pub fn with_components(
        store: Arc<dyn KeyValueStore>,
        status_source: Arc<dyn BookingStatusSource>,
        config: AppConfig,
    ) -> Self {
        let notification_store = Arc::new(NotificationStore::new(store.clone()));
        let booking_tracker = Arc::new(BookingTracker::new(store, status_source, notification_store.clone()));
        let poller = BookingStatusPoller::new(booking_tracker.clone());

        Self {
            notification_store,
            booking_tracker,
            poller,
            config,
        }
    }
}
