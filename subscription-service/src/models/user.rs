//! User identity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Known identity. Credentials live with the authentication gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "id")]
    pub user_id: Uuid,
    pub username: String,
    #[serde(rename = "createdAt")]
    pub created_utc: DateTime<Utc>,
}
