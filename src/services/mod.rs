pub mod booking_tracker;
pub mod notification_service;
pub mod poller;
pub mod status_client;
pub mod storage;
