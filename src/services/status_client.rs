// src/services/status_client.rs
use async_trait::async_trait;
use std::time::Duration;
use tracing;

use crate::{
    errors::TrackerError as AppError,
    models::booking::{BookingStatusResponse, BookingType},
};

/// Where the tracker learns the current status of a booking.
#[async_trait]
pub trait BookingStatusSource: Send + Sync {
    /// `Ok(None)` means the backend answered but the payload carried no status.
    async fn fetch_status(&self, booking_id: i64, booking_type: BookingType) -> Result<Option<String>, AppError>;
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub timeout: Option<Duration>,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: None,
            timeout: None,
        }
    }
}

pub struct HttpBookingStatusClient {
    config: BackendConfig,
    client: reqwest::Client,
}

impl HttpBookingStatusClient {
    pub fn new(config: BackendConfig) -> Result<Self, AppError> {
        if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
            return Err(AppError::InvalidUrl(config.base_url));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { config, client })
    }

    pub fn status_url(&self, booking_id: i64, booking_type: BookingType) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        match booking_type {
            BookingType::Ride => format!("{}/api/corporate/bookings/{}/", base, booking_id),
            BookingType::Service => format!("{}/api/corporate/service-bookings/{}/", base, booking_id),
        }
    }
}

#[async_trait]
impl BookingStatusSource for HttpBookingStatusClient {
    async fn fetch_status(&self, booking_id: i64, booking_type: BookingType) -> Result<Option<String>, AppError> {
        let url = self.status_url(booking_id, booking_type);
        tracing::debug!("Fetching booking status: {}", url);

        let mut request = self.client.get(&url).header("Accept", "application/json");
        if let Some(token) = &self.config.auth_token {
            request = request.header("Authorization", format!("Token {}", token));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(AppError::UnexpectedStatus {
                booking_id,
                status: response.status().as_u16(),
            });
        }

        let body: BookingStatusResponse = response.json().await?;
        Ok(body.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_url_by_type() {
        let client = HttpBookingStatusClient::new(BackendConfig::new("https://api.example.com/")).unwrap();

        assert_eq!(
            client.status_url(42, BookingType::Ride),
            "https://api.example.com/api/corporate/bookings/42/"
        );
        assert_eq!(
            client.status_url(7, BookingType::Service),
            "https://api.example.com/api/corporate/service-bookings/7/"
        );
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let result = HttpBookingStatusClient::new(BackendConfig::new("ftp://backend"));
        assert!(matches!(result, Err(AppError::InvalidUrl(_))));
    }
}
