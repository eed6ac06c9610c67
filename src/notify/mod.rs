//! User-facing notification channel
//!
//! Best-effort push over websockets. Delivery failures are logged and
//! discarded; nothing in the order path ever waits on, or fails because of,
//! a notification.

pub mod connection;
pub mod messages;
pub mod service;

pub use connection::{ConnectionId, ConnectionRegistry};
pub use messages::Notification;
pub use service::{NotificationSink, WsNotifier};
