//! Demo data for local runs.

use crate::models::{AddGroupMember, BillingCycle, CreateGroup, CreateSubscription, User};
use crate::services::store::Store;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use service_core::error::AppError;
use tracing::{info, instrument};

pub const DEMO_USERNAME: &str = "demo";

struct DemoSubscription {
    name: &'static str,
    cost: Decimal,
    start: (i32, u32, u32),
    is_active: bool,
    auto_cancel: bool,
    usages: i64,
}

fn demo_subscriptions() -> [DemoSubscription; 4] {
    [
        DemoSubscription {
            name: "Netflix",
            cost: Decimal::new(1599, 2),
            start: (2024, 1, 1),
            is_active: true,
            auto_cancel: false,
            usages: 15,
        },
        DemoSubscription {
            name: "Gym Membership",
            cost: Decimal::new(5000, 2),
            start: (2024, 2, 15),
            is_active: true,
            auto_cancel: true,
            usages: 5,
        },
        DemoSubscription {
            name: "Adobe Cloud",
            cost: Decimal::new(5499, 2),
            start: (2023, 11, 1),
            is_active: true,
            auto_cancel: false,
            usages: 0,
        },
        DemoSubscription {
            name: "Old Magazine",
            cost: Decimal::new(999, 2),
            start: (2023, 5, 1),
            is_active: false,
            auto_cancel: false,
            usages: 0,
        },
    ]
}

fn utc_date((year, month, day): (i32, u32, u32)) -> Result<DateTime<Utc>, AppError> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("invalid seed date")))
}

/// Seed the demo user with four subscriptions, usage history and a
/// "Roommates" group. Usage is placed on the days before `now` so it lands in
/// both the scoring period and the waste window.
///
/// Does nothing if the demo user already owns subscriptions. Returns the demo
/// user and whether anything was written.
#[instrument(skip(store), fields(backend = store.backend_name()))]
pub async fn seed_demo_data<S>(store: &S, now: DateTime<Utc>) -> Result<(User, bool), AppError>
where
    S: Store + ?Sized,
{
    let user = store.upsert_user(DEMO_USERNAME).await?;

    if !store.list_subscriptions(user.user_id).await?.is_empty() {
        info!(user_id = %user.user_id, "Demo data already present, skipping seed");
        return Ok((user, false));
    }

    for demo in demo_subscriptions() {
        let subscription = store
            .create_subscription(&CreateSubscription {
                user_id: user.user_id,
                name: demo.name.to_string(),
                cost: demo.cost,
                billing_cycle: BillingCycle::Monthly,
                start_date: utc_date(demo.start)?,
                trial_end_date: None,
                is_active: demo.is_active,
                auto_cancel: demo.auto_cancel,
            })
            .await?;

        for day in (0..demo.usages).rev() {
            store
                .append_usage(subscription.subscription_id, now - Duration::days(day))
                .await?;
        }
    }

    let group = store
        .create_group(&CreateGroup {
            owner_id: user.user_id,
            name: "Roommates".to_string(),
        })
        .await?;

    for (member_name, user_id) in [("Me", Some(user.user_id)), ("John", None)] {
        store
            .add_group_member(&AddGroupMember {
                group_id: group.group_id,
                user_id,
                member_name: member_name.to_string(),
                split_percentage: Decimal::new(50, 0),
            })
            .await?;
    }

    info!(user_id = %user.user_id, "Demo data seeded");
    Ok((user, true))
}
