//! PostgreSQL store for subscription-service.

use crate::models::{
    AddGroupMember, CreateGroup, CreateSubscription, Group, GroupMember, Subscription,
    UpdateSubscription, UsageLogEntry, User,
};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::store::{GroupStore, Store, SubscriptionStore, UsageLedger, UserStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

const SUBSCRIPTION_COLUMNS: &str = "subscription_id, user_id, name, cost, billing_cycle, start_date, trial_end_date, is_active, auto_cancel, last_usage_date, created_utc";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "subscription-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

// =========================================================================
// Subscription Operations
// =========================================================================

#[async_trait]
impl SubscriptionStore for Database {
    #[instrument(skip(self, input), fields(user_id = %input.user_id))]
    async fn create_subscription(
        &self,
        input: &CreateSubscription,
    ) -> Result<Subscription, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_subscription"])
            .start_timer();

        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            r#"
            INSERT INTO subscriptions (subscription_id, user_id, name, cost, billing_cycle, start_date, trial_end_date, is_active, auto_cancel)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(input.user_id)
        .bind(&input.name)
        .bind(input.cost)
        .bind(input.billing_cycle.as_str())
        .bind(input.start_date)
        .bind(input.trial_end_date)
        .bind(input.is_active)
        .bind(input.auto_cancel)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create subscription: {}", e))
        })?;

        timer.observe_duration();
        info!(subscription_id = %subscription.subscription_id, name = %subscription.name, "Subscription created");

        Ok(subscription)
    }

    #[instrument(skip(self), fields(user_id = %user_id, subscription_id = %subscription_id))]
    async fn get_subscription(
        &self,
        user_id: Uuid,
        subscription_id: Uuid,
    ) -> Result<Option<Subscription>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_subscription"])
            .start_timer();

        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            r#"
            SELECT {SUBSCRIPTION_COLUMNS}
            FROM subscriptions
            WHERE user_id = $1 AND subscription_id = $2
            "#
        ))
        .bind(user_id)
        .bind(subscription_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get subscription: {}", e)))?;

        timer.observe_duration();

        Ok(subscription)
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn list_subscriptions(&self, user_id: Uuid) -> Result<Vec<Subscription>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_subscriptions"])
            .start_timer();

        let subscriptions = sqlx::query_as::<_, Subscription>(&format!(
            r#"
            SELECT {SUBSCRIPTION_COLUMNS}
            FROM subscriptions
            WHERE user_id = $1
            ORDER BY created_utc, subscription_id
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list subscriptions: {}", e))
        })?;

        timer.observe_duration();

        Ok(subscriptions)
    }

    #[instrument(skip(self, input), fields(user_id = %user_id, subscription_id = %subscription_id))]
    async fn update_subscription(
        &self,
        user_id: Uuid,
        subscription_id: Uuid,
        input: &UpdateSubscription,
    ) -> Result<Option<Subscription>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_subscription"])
            .start_timer();

        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            r#"
            UPDATE subscriptions
            SET name = COALESCE($3, name),
                cost = COALESCE($4, cost),
                billing_cycle = COALESCE($5, billing_cycle),
                trial_end_date = COALESCE($6, trial_end_date),
                is_active = COALESCE($7, is_active),
                auto_cancel = COALESCE($8, auto_cancel)
            WHERE user_id = $1 AND subscription_id = $2
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(subscription_id)
        .bind(&input.name)
        .bind(input.cost)
        .bind(input.billing_cycle.map(|c| c.as_str()))
        .bind(input.trial_end_date)
        .bind(input.is_active)
        .bind(input.auto_cancel)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update subscription: {}", e))
        })?;

        timer.observe_duration();

        Ok(subscription)
    }

    #[instrument(skip(self), fields(user_id = %user_id, subscription_id = %subscription_id))]
    async fn delete_subscription(
        &self,
        user_id: Uuid,
        subscription_id: Uuid,
    ) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_subscription"])
            .start_timer();

        // usage_logs rows go with it via ON DELETE CASCADE
        let result = sqlx::query(
            r#"
            DELETE FROM subscriptions
            WHERE user_id = $1 AND subscription_id = $2
            "#,
        )
        .bind(user_id)
        .bind(subscription_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to delete subscription: {}", e))
        })?;

        timer.observe_duration();

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!("Subscription deleted");
        }

        Ok(deleted)
    }
}

// =========================================================================
// Usage Operations
// =========================================================================

#[async_trait]
impl UsageLedger for Database {
    #[instrument(skip(self), fields(subscription_id = %subscription_id))]
    async fn append_usage(
        &self,
        subscription_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<UsageLogEntry, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["append_usage"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let touched = sqlx::query(
            r#"
            UPDATE subscriptions
            SET last_usage_date = $2
            WHERE subscription_id = $1
            "#,
        )
        .bind(subscription_id)
        .bind(at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update last usage date: {}", e))
        })?;

        if touched.rows_affected() == 0 {
            // dropping tx rolls back
            return Err(AppError::NotFound(anyhow::anyhow!("Subscription not found")));
        }

        let entry = sqlx::query_as::<_, UsageLogEntry>(
            r#"
            INSERT INTO usage_logs (log_id, subscription_id, used_at)
            VALUES ($1, $2, $3)
            RETURNING log_id, subscription_id, used_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(subscription_id)
        .bind(at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to log usage: {}", e)))?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit usage log: {}", e))
        })?;

        timer.observe_duration();

        Ok(entry)
    }

    #[instrument(skip(self), fields(subscription_id = %subscription_id))]
    async fn count_usage_since(
        &self,
        subscription_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["count_usage_since"])
            .start_timer();

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM usage_logs
            WHERE subscription_id = $1 AND used_at >= $2
            "#,
        )
        .bind(subscription_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count usage: {}", e)))?;

        timer.observe_duration();

        Ok(count)
    }

    #[instrument(skip(self), fields(subscription_id = %subscription_id))]
    async fn list_usage(&self, subscription_id: Uuid) -> Result<Vec<UsageLogEntry>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_usage"])
            .start_timer();

        let entries = sqlx::query_as::<_, UsageLogEntry>(
            r#"
            SELECT log_id, subscription_id, used_at
            FROM usage_logs
            WHERE subscription_id = $1
            ORDER BY used_at DESC
            "#,
        )
        .bind(subscription_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list usage: {}", e)))?;

        timer.observe_duration();

        Ok(entries)
    }
}

// =========================================================================
// User Operations
// =========================================================================

#[async_trait]
impl UserStore for Database {
    #[instrument(skip(self))]
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_user_by_username"])
            .start_timer();

        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, username, created_utc
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to find user: {}", e)))?;

        timer.observe_duration();

        Ok(user)
    }

    #[instrument(skip(self))]
    async fn upsert_user(&self, username: &str) -> Result<User, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["upsert_user"])
            .start_timer();

        // The no-op update makes RETURNING yield the existing row on conflict.
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (user_id, username)
            VALUES ($1, $2)
            ON CONFLICT (username) DO UPDATE SET username = EXCLUDED.username
            RETURNING user_id, username, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to upsert user: {}", e)))?;

        timer.observe_duration();

        Ok(user)
    }
}

// =========================================================================
// Group Operations
// =========================================================================

#[async_trait]
impl GroupStore for Database {
    #[instrument(skip(self, input), fields(owner_id = %input.owner_id))]
    async fn create_group(&self, input: &CreateGroup) -> Result<Group, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_group"])
            .start_timer();

        let group = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO expense_groups (group_id, owner_id, name)
            VALUES ($1, $2, $3)
            RETURNING group_id, owner_id, name, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.owner_id)
        .bind(&input.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create group: {}", e)))?;

        timer.observe_duration();
        info!(group_id = %group.group_id, "Group created");

        Ok(group)
    }

    #[instrument(skip(self))]
    async fn get_group(&self, owner_id: Uuid, group_id: Uuid) -> Result<Option<Group>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_group"])
            .start_timer();

        let group = sqlx::query_as::<_, Group>(
            r#"
            SELECT group_id, owner_id, name, created_utc
            FROM expense_groups
            WHERE owner_id = $1 AND group_id = $2
            "#,
        )
        .bind(owner_id)
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get group: {}", e)))?;

        timer.observe_duration();

        Ok(group)
    }

    #[instrument(skip(self))]
    async fn list_groups(&self, owner_id: Uuid) -> Result<Vec<Group>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_groups"])
            .start_timer();

        let groups = sqlx::query_as::<_, Group>(
            r#"
            SELECT group_id, owner_id, name, created_utc
            FROM expense_groups
            WHERE owner_id = $1
            ORDER BY created_utc, group_id
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list groups: {}", e)))?;

        timer.observe_duration();

        Ok(groups)
    }

    #[instrument(skip(self, input), fields(group_id = %input.group_id))]
    async fn add_group_member(&self, input: &AddGroupMember) -> Result<GroupMember, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["add_group_member"])
            .start_timer();

        let member = sqlx::query_as::<_, GroupMember>(
            r#"
            INSERT INTO group_members (member_id, group_id, user_id, member_name, split_percentage)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING member_id, group_id, user_id, member_name, split_percentage
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.group_id)
        .bind(input.user_id)
        .bind(&input.member_name)
        .bind(input.split_percentage)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to add group member: {}", e))
        })?;

        timer.observe_duration();

        Ok(member)
    }

    #[instrument(skip(self))]
    async fn list_group_members(&self, group_id: Uuid) -> Result<Vec<GroupMember>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_group_members"])
            .start_timer();

        let members = sqlx::query_as::<_, GroupMember>(
            r#"
            SELECT member_id, group_id, user_id, member_name, split_percentage
            FROM group_members
            WHERE group_id = $1
            ORDER BY member_name
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list group members: {}", e))
        })?;

        timer.observe_duration();

        Ok(members)
    }
}

#[async_trait]
impl Store for Database {
    /// Check database health.
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["health_check"])
            .start_timer();

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;

        timer.observe_duration();
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
