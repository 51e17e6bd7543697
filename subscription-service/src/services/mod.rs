//! Services module for subscription-service.

pub mod dashboard;
pub mod database;
pub mod memory;
pub mod metrics;
pub mod scoring;
pub mod seed;
pub mod store;

pub use database::Database;
pub use memory::MemoryStore;
pub use metrics::{
    get_metrics, init_metrics, record_dashboard_request, record_error,
    record_subscription_operation, record_usage_logged, record_value_score,
};
pub use seed::seed_demo_data;
pub use store::{GroupStore, Store, SubscriptionStore, UsageLedger, UserStore};
