//! Portfolio rollup for the dashboard.

use crate::models::{DashboardStats, Subscription};
use crate::services::store::UsageLedger;
use chrono::{DateTime, Duration, Utc};
use service_core::error::AppError;

/// Days of inactivity after which an active subscription counts as waste.
pub const WASTE_WINDOW_DAYS: i64 = 30;

/// Start of the waste window. Independent of the calendar-month scoring
/// period, so the two can disagree near month boundaries.
pub fn waste_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(WASTE_WINDOW_DAYS)
}

/// Aggregate a user's subscriptions.
///
/// Active subscriptions contribute their raw cost to the spend total, whatever
/// their billing cycle. Inactive ones are only counted. The first failing
/// usage lookup aborts the rollup.
pub async fn aggregate<L>(
    ledger: &L,
    subscriptions: &[Subscription],
    now: DateTime<Utc>,
) -> Result<DashboardStats, AppError>
where
    L: UsageLedger + ?Sized,
{
    let since = waste_window_start(now);
    let mut stats = DashboardStats::default();

    for subscription in subscriptions {
        if !subscription.is_active {
            stats.cancelled_count += 1;
            continue;
        }

        stats.total_monthly_spend += subscription.cost;
        stats.active_count += 1;

        let recent_usage = ledger
            .count_usage_since(subscription.subscription_id, since)
            .await?;
        if recent_usage == 0 {
            stats.waste_count += 1;
        }
    }

    Ok(stats)
}
