//! Notification payloads pushed to websocket clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single notification as delivered to a client
///
/// `user_id` is None for platform-wide broadcasts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn to_user(user_id: i64, kind: &str, title: &str, message: &str) -> Self {
        Self {
            user_id: Some(user_id),
            kind: kind.to_string(),
            title: title.to_string(),
            message: message.to_string(),
            read: false,
            created_at: Utc::now(),
        }
    }

    pub fn broadcast(kind: &str, title: &str, message: &str) -> Self {
        Self {
            user_id: None,
            kind: kind.to_string(),
            title: title.to_string(),
            message: message.to_string(),
            read: false,
            created_at: Utc::now(),
        }
    }
}
