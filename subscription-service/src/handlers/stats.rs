use axum::{extract::State, Json};
use chrono::Utc;
use service_core::error::AppError;

use crate::{
    middleware::UserContext,
    models::DashboardStats,
    services::{dashboard, record_dashboard_request, record_error},
    startup::AppState,
};

/// Spend and activity rollup across the caller's subscriptions.
pub async fn dashboard_stats(
    State(state): State<AppState>,
    user: UserContext,
) -> Result<Json<DashboardStats>, AppError> {
    let result = async {
        let subscriptions = state.store.list_subscriptions(user.user_id).await?;
        dashboard::aggregate(&*state.store, &subscriptions, Utc::now()).await
    }
    .await;

    match result {
        Ok(stats) => {
            record_dashboard_request("success");
            tracing::info!(
                total_monthly_spend = %stats.total_monthly_spend,
                active_count = stats.active_count,
                cancelled_count = stats.cancelled_count,
                waste_count = stats.waste_count,
                "Dashboard computed"
            );
            Ok(Json(stats))
        }
        Err(e) => {
            record_dashboard_request("error");
            record_error("aggregate", "dashboard_stats");
            Err(e)
        }
    }
}
