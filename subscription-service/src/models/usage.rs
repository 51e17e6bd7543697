//! Usage log model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One logged use of a subscription. Entries are append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UsageLogEntry {
    #[serde(rename = "id")]
    pub log_id: Uuid,
    pub subscription_id: Uuid,
    #[serde(rename = "timestamp")]
    pub used_at: DateTime<Utc>,
}
