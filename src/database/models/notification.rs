use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub notification_id: i64,
    pub recipient: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
