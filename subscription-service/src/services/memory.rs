//! In-process store. Used when no database is configured and by the test suite.

use crate::models::{
    to_money, AddGroupMember, CreateGroup, CreateSubscription, Group, GroupMember, Subscription,
    UpdateSubscription, UsageLogEntry, User,
};
use crate::services::store::{GroupStore, Store, SubscriptionStore, UsageLedger, UserStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use tokio::sync::RwLock;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    subscriptions: Vec<Subscription>,
    usage_logs: Vec<UsageLogEntry>,
    groups: Vec<Group>,
    group_members: Vec<GroupMember>,
}

/// Store backed by vectors behind a single lock.
///
/// One lock over all tables makes compound writes (usage append + last usage
/// date, cascading delete) atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    #[instrument(skip(self, input), fields(user_id = %input.user_id))]
    async fn create_subscription(
        &self,
        input: &CreateSubscription,
    ) -> Result<Subscription, AppError> {
        let subscription = Subscription {
            subscription_id: Uuid::new_v4(),
            user_id: input.user_id,
            name: input.name.clone(),
            cost: to_money(input.cost),
            billing_cycle: input.billing_cycle.as_str().to_string(),
            start_date: input.start_date,
            trial_end_date: input.trial_end_date,
            is_active: input.is_active,
            auto_cancel: input.auto_cancel,
            last_usage_date: None,
            created_utc: Utc::now(),
        };

        self.tables
            .write()
            .await
            .subscriptions
            .push(subscription.clone());

        info!(subscription_id = %subscription.subscription_id, name = %subscription.name, "Subscription created");
        Ok(subscription)
    }

    async fn get_subscription(
        &self,
        user_id: Uuid,
        subscription_id: Uuid,
    ) -> Result<Option<Subscription>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .subscriptions
            .iter()
            .find(|s| s.subscription_id == subscription_id && s.user_id == user_id)
            .cloned())
    }

    async fn list_subscriptions(&self, user_id: Uuid) -> Result<Vec<Subscription>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .subscriptions
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    #[instrument(skip(self, input))]
    async fn update_subscription(
        &self,
        user_id: Uuid,
        subscription_id: Uuid,
        input: &UpdateSubscription,
    ) -> Result<Option<Subscription>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(subscription) = tables
            .subscriptions
            .iter_mut()
            .find(|s| s.subscription_id == subscription_id && s.user_id == user_id)
        else {
            return Ok(None);
        };

        if let Some(name) = &input.name {
            subscription.name = name.clone();
        }
        if let Some(cost) = input.cost {
            subscription.cost = to_money(cost);
        }
        if let Some(cycle) = input.billing_cycle {
            subscription.billing_cycle = cycle.as_str().to_string();
        }
        if let Some(trial_end_date) = input.trial_end_date {
            subscription.trial_end_date = Some(trial_end_date);
        }
        if let Some(is_active) = input.is_active {
            subscription.is_active = is_active;
        }
        if let Some(auto_cancel) = input.auto_cancel {
            subscription.auto_cancel = auto_cancel;
        }

        Ok(Some(subscription.clone()))
    }

    #[instrument(skip(self))]
    async fn delete_subscription(
        &self,
        user_id: Uuid,
        subscription_id: Uuid,
    ) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let before = tables.subscriptions.len();
        tables
            .subscriptions
            .retain(|s| !(s.subscription_id == subscription_id && s.user_id == user_id));

        if tables.subscriptions.len() == before {
            return Ok(false);
        }

        tables
            .usage_logs
            .retain(|entry| entry.subscription_id != subscription_id);
        info!("Subscription deleted with its usage log");
        Ok(true)
    }
}

#[async_trait]
impl UsageLedger for MemoryStore {
    #[instrument(skip(self))]
    async fn append_usage(
        &self,
        subscription_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<UsageLogEntry, AppError> {
        let mut tables = self.tables.write().await;
        let subscription = tables
            .subscriptions
            .iter_mut()
            .find(|s| s.subscription_id == subscription_id)
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Subscription not found")))?;
        subscription.last_usage_date = Some(at);

        let entry = UsageLogEntry {
            log_id: Uuid::new_v4(),
            subscription_id,
            used_at: at,
        };
        tables.usage_logs.push(entry.clone());

        Ok(entry)
    }

    async fn count_usage_since(
        &self,
        subscription_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let tables = self.tables.read().await;
        let count = tables
            .usage_logs
            .iter()
            .filter(|entry| entry.subscription_id == subscription_id && entry.used_at >= since)
            .count();
        Ok(count as i64)
    }

    async fn list_usage(&self, subscription_id: Uuid) -> Result<Vec<UsageLogEntry>, AppError> {
        let tables = self.tables.read().await;
        let mut entries: Vec<UsageLogEntry> = tables
            .usage_logs
            .iter()
            .filter(|entry| entry.subscription_id == subscription_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.used_at.cmp(&a.used_at));
        Ok(entries)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn upsert_user(&self, username: &str) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.users.iter().find(|u| u.username == username) {
            return Ok(existing.clone());
        }

        let user = User {
            user_id: Uuid::new_v4(),
            username: username.to_string(),
            created_utc: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl GroupStore for MemoryStore {
    async fn create_group(&self, input: &CreateGroup) -> Result<Group, AppError> {
        let group = Group {
            group_id: Uuid::new_v4(),
            owner_id: input.owner_id,
            name: input.name.clone(),
            created_utc: Utc::now(),
        };
        self.tables.write().await.groups.push(group.clone());
        Ok(group)
    }

    async fn get_group(&self, owner_id: Uuid, group_id: Uuid) -> Result<Option<Group>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .groups
            .iter()
            .find(|g| g.group_id == group_id && g.owner_id == owner_id)
            .cloned())
    }

    async fn list_groups(&self, owner_id: Uuid) -> Result<Vec<Group>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .groups
            .iter()
            .filter(|g| g.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn add_group_member(&self, input: &AddGroupMember) -> Result<GroupMember, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.groups.iter().any(|g| g.group_id == input.group_id) {
            return Err(AppError::NotFound(anyhow::anyhow!("Group not found")));
        }

        let member = GroupMember {
            member_id: Uuid::new_v4(),
            group_id: input.group_id,
            user_id: input.user_id,
            member_name: input.member_name.clone(),
            split_percentage: to_money(input.split_percentage),
        };
        tables.group_members.push(member.clone());
        Ok(member)
    }

    async fn list_group_members(&self, group_id: Uuid) -> Result<Vec<GroupMember>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .group_members
            .iter()
            .filter(|m| m.group_id == group_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BillingCycle;
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;

    fn create_input(user_id: Uuid, name: &str) -> CreateSubscription {
        CreateSubscription {
            user_id,
            name: name.to_string(),
            cost: Decimal::new(1599, 2),
            billing_cycle: BillingCycle::Monthly,
            start_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            trial_end_date: None,
            is_active: true,
            auto_cancel: false,
        }
    }

    #[tokio::test]
    async fn append_usage_updates_last_usage_date() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let sub = store
            .create_subscription(&create_input(user_id, "Netflix"))
            .await
            .unwrap();
        let at = Utc.with_ymd_and_hms(2024, 6, 10, 12, 30, 0).unwrap();

        let entry = store.append_usage(sub.subscription_id, at).await.unwrap();
        assert_eq!(entry.used_at, at);

        let reloaded = store
            .get_subscription(user_id, sub.subscription_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.last_usage_date, Some(at));
    }

    #[tokio::test]
    async fn append_usage_for_unknown_subscription_is_not_found() {
        let store = MemoryStore::new();
        let result = store.append_usage(Uuid::new_v4(), Utc::now()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn count_since_is_inclusive_and_zero_without_history() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let sub = store
            .create_subscription(&create_input(user_id, "Gym"))
            .await
            .unwrap();
        let since = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        assert_eq!(
            store.count_usage_since(sub.subscription_id, since).await.unwrap(),
            0
        );

        store
            .append_usage(sub.subscription_id, since - Duration::seconds(1))
            .await
            .unwrap();
        store.append_usage(sub.subscription_id, since).await.unwrap();
        store
            .append_usage(sub.subscription_id, since + Duration::days(3))
            .await
            .unwrap();

        assert_eq!(
            store.count_usage_since(sub.subscription_id, since).await.unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn lookups_are_scoped_to_owner() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let sub = store
            .create_subscription(&create_input(owner, "Adobe Cloud"))
            .await
            .unwrap();

        assert!(store
            .get_subscription(stranger, sub.subscription_id)
            .await
            .unwrap()
            .is_none());
        assert!(!store
            .delete_subscription(stranger, sub.subscription_id)
            .await
            .unwrap());
        assert!(store.list_subscriptions(stranger).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_cascades_to_usage_log() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let sub = store
            .create_subscription(&create_input(user_id, "Netflix"))
            .await
            .unwrap();
        store.append_usage(sub.subscription_id, Utc::now()).await.unwrap();

        assert!(store
            .delete_subscription(user_id, sub.subscription_id)
            .await
            .unwrap());
        assert!(store.list_usage(sub.subscription_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_changes_only_given_fields() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let sub = store
            .create_subscription(&create_input(user_id, "Netflix"))
            .await
            .unwrap();

        let updated = store
            .update_subscription(
                user_id,
                sub.subscription_id,
                &UpdateSubscription {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert!(!updated.is_active);
        assert_eq!(updated.name, "Netflix");
        assert_eq!(updated.cost.to_string(), "15.99");
        assert_eq!(updated.start_date, sub.start_date);
    }

    #[tokio::test]
    async fn upsert_user_is_idempotent() {
        let store = MemoryStore::new();
        let first = store.upsert_user("demo").await.unwrap();
        let second = store.upsert_user("demo").await.unwrap();
        assert_eq!(first.user_id, second.user_id);
    }
}
