pub mod booking;
pub mod notification;
