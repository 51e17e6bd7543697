//! Subscription model.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Billing cycle of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    Monthly,
    Yearly,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Yearly => "yearly",
        }
    }
}

/// Subscription record as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(rename = "id")]
    pub subscription_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub cost: Decimal,
    pub billing_cycle: String,
    pub start_date: DateTime<Utc>,
    pub trial_end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    /// Advisory "Ghost Cancel" flag; nothing deactivates subscriptions automatically.
    pub auto_cancel: bool,
    pub last_usage_date: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_utc: DateTime<Utc>,
}

/// Input for creating a subscription.
#[derive(Debug, Clone)]
pub struct CreateSubscription {
    pub user_id: Uuid,
    pub name: String,
    pub cost: Decimal,
    pub billing_cycle: BillingCycle,
    pub start_date: DateTime<Utc>,
    pub trial_end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub auto_cancel: bool,
}

/// Partial update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateSubscription {
    pub name: Option<String>,
    pub cost: Option<Decimal>,
    pub billing_cycle: Option<BillingCycle>,
    pub trial_end_date: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
    pub auto_cancel: Option<bool>,
}

impl UpdateSubscription {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.cost.is_none()
            && self.billing_cycle.is_none()
            && self.trial_end_date.is_none()
            && self.is_active.is_none()
            && self.auto_cancel.is_none()
    }
}

/// Normalise a money amount to the stored NUMERIC(10,2) representation.
pub fn to_money(amount: Decimal) -> Decimal {
    let mut amount = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    amount.rescale(2);
    amount
}
