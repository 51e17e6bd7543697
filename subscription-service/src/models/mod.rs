//! Domain models for subscription-service.

mod group;
mod subscription;
mod usage;
mod user;
mod view;

pub use group::{AddGroupMember, CreateGroup, Group, GroupMember};
pub use subscription::{
    to_money, BillingCycle, CreateSubscription, Subscription, UpdateSubscription,
};
pub use usage::UsageLogEntry;
pub use user::User;
pub use view::{DashboardStats, SubscriptionView, ValueScore};
