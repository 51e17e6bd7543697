//! Storage contracts consumed by the handlers, scoring and dashboard code.
//!
//! Two backends implement them: [`Database`](super::Database) on PostgreSQL and
//! [`MemoryStore`](super::MemoryStore) in process.

use crate::models::{
    AddGroupMember, CreateGroup, CreateSubscription, Group, GroupMember, Subscription,
    UpdateSubscription, UsageLogEntry, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use uuid::Uuid;

/// Subscription records. Every lookup is scoped to the owning user; a record
/// owned by someone else behaves as absent.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn create_subscription(
        &self,
        input: &CreateSubscription,
    ) -> Result<Subscription, AppError>;

    async fn get_subscription(
        &self,
        user_id: Uuid,
        subscription_id: Uuid,
    ) -> Result<Option<Subscription>, AppError>;

    /// All subscriptions of a user, oldest first.
    async fn list_subscriptions(&self, user_id: Uuid) -> Result<Vec<Subscription>, AppError>;

    async fn update_subscription(
        &self,
        user_id: Uuid,
        subscription_id: Uuid,
        input: &UpdateSubscription,
    ) -> Result<Option<Subscription>, AppError>;

    /// Delete a subscription together with its usage log entries.
    /// Returns false when nothing was deleted.
    async fn delete_subscription(
        &self,
        user_id: Uuid,
        subscription_id: Uuid,
    ) -> Result<bool, AppError>;
}

/// Append-only usage log.
#[async_trait]
pub trait UsageLedger: Send + Sync {
    /// Record one use at `at` and set the subscription's `last_usage_date` to
    /// the same instant. Both writes land or neither does.
    async fn append_usage(
        &self,
        subscription_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<UsageLogEntry, AppError>;

    /// Entries with `used_at >= since`. Zero for a subscription without history.
    async fn count_usage_since(
        &self,
        subscription_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64, AppError>;

    /// Entries newest first.
    async fn list_usage(&self, subscription_id: Uuid) -> Result<Vec<UsageLogEntry>, AppError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// Return the user with this name, creating it if needed.
    async fn upsert_user(&self, username: &str) -> Result<User, AppError>;
}

#[async_trait]
pub trait GroupStore: Send + Sync {
    async fn create_group(&self, input: &CreateGroup) -> Result<Group, AppError>;

    async fn get_group(&self, owner_id: Uuid, group_id: Uuid) -> Result<Option<Group>, AppError>;

    async fn list_groups(&self, owner_id: Uuid) -> Result<Vec<Group>, AppError>;

    async fn add_group_member(&self, input: &AddGroupMember) -> Result<GroupMember, AppError>;

    async fn list_group_members(&self, group_id: Uuid) -> Result<Vec<GroupMember>, AppError>;
}

/// Everything the service needs from a backend.
#[async_trait]
pub trait Store: SubscriptionStore + UsageLedger + UserStore + GroupStore {
    async fn health_check(&self) -> Result<(), AppError>;

    fn backend_name(&self) -> &'static str;
}
