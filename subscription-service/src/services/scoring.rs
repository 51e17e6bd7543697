//! Per-subscription value scoring.
//!
//! A subscription is scored from its persisted usage log alone: usage in the
//! current period, cost per use, value tier and the renewal estimate. Nothing
//! here is cached or persisted; every read recomputes.

use crate::models::{Subscription, SubscriptionView, ValueScore};
use crate::services::store::UsageLedger;
use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Utc};
use futures::future::try_join_all;
use rust_decimal::{Decimal, RoundingStrategy};
use service_core::error::AppError;

/// Start of the scoring period: one calendar month before `now`.
///
/// The month is decremented with day-of-month and time-of-day kept. A day that
/// does not exist in the previous month overflows into the next one, so
/// 31 March maps to 3 March (2 March in leap years), not to the end of February.
/// The window is not clamped to the subscription's start date.
pub fn period_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let (year, month) = match now.month() {
        1 => (now.year() - 1, 12),
        m => (now.year(), m - 1),
    };

    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.checked_add_days(Days::new(u64::from(now.day() - 1))))
        .map(|date| Utc.from_utc_datetime(&date.and_time(now.time())))
        .unwrap_or(now)
}

/// Cost per use, formatted with exactly two decimals.
///
/// With no usage the raw cost is passed through unchanged. That mixes units
/// (cost per cycle vs. cost per use) but is what clients currently display.
pub fn cost_per_use(cost: Decimal, usage_count: i64) -> String {
    if usage_count > 0 {
        let mut per_use = (cost / Decimal::from(usage_count))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        per_use.rescale(2);
        per_use.to_string()
    } else {
        cost.to_string()
    }
}

/// Renewal estimate: `30 - day_of_month(start_date)`.
///
/// A fixed heuristic that ignores the current date. Negative for subscriptions
/// started on the 31st.
pub fn days_until_renewal(start_date: DateTime<Utc>) -> i64 {
    30 - i64::from(start_date.day())
}

/// Build the scored view from a subscription and its period usage count.
pub fn derive_view(subscription: Subscription, usage_count: i64) -> SubscriptionView {
    let cost_per_use = cost_per_use(subscription.cost, usage_count);
    let days_until_renewal = days_until_renewal(subscription.start_date);

    SubscriptionView {
        subscription,
        usage_count,
        cost_per_use,
        value_score: ValueScore::from_usage_count(usage_count),
        days_until_renewal,
    }
}

/// Score one subscription as of `now`.
pub async fn score<L>(
    ledger: &L,
    subscription: Subscription,
    now: DateTime<Utc>,
) -> Result<SubscriptionView, AppError>
where
    L: UsageLedger + ?Sized,
{
    let usage_count = ledger
        .count_usage_since(subscription.subscription_id, period_start(now))
        .await?;

    Ok(derive_view(subscription, usage_count))
}

/// Score every subscription, preserving input order. Fails if any lookup fails.
pub async fn score_all<L>(
    ledger: &L,
    subscriptions: Vec<Subscription>,
    now: DateTime<Utc>,
) -> Result<Vec<SubscriptionView>, AppError>
where
    L: UsageLedger + ?Sized,
{
    try_join_all(
        subscriptions
            .into_iter()
            .map(|subscription| score(ledger, subscription, now)),
    )
    .await
}
