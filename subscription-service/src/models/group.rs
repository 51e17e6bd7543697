//! Group wallet models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A group that splits subscription costs among its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(rename = "id")]
    pub group_id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    #[serde(rename = "createdAt")]
    pub created_utc: DateTime<Utc>,
}

/// Member of a group. `user_id` is `None` for virtual members that only have a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    #[serde(rename = "id")]
    pub member_id: Uuid,
    pub group_id: Uuid,
    pub user_id: Option<Uuid>,
    pub member_name: String,
    pub split_percentage: Decimal,
}

/// Input for creating a group.
#[derive(Debug, Clone)]
pub struct CreateGroup {
    pub owner_id: Uuid,
    pub name: String,
}

/// Input for adding a member to a group.
#[derive(Debug, Clone)]
pub struct AddGroupMember {
    pub group_id: Uuid,
    pub user_id: Option<Uuid>,
    pub member_name: String,
    pub split_percentage: Decimal,
}
