//! Usage logging ("I used this").

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    middleware::UserContext,
    models::UsageLogEntry,
    services::{record_error, record_usage_logged},
    startup::AppState,
};

async fn ensure_owned(
    state: &AppState,
    user: &UserContext,
    subscription_id: Uuid,
) -> Result<(), AppError> {
    state
        .store
        .get_subscription(user.user_id, subscription_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Subscription not found")))
}

/// Record one use now. Also moves the subscription's `lastUsageDate`.
pub async fn log_usage(
    State(state): State<AppState>,
    user: UserContext,
    Path(subscription_id): Path<Uuid>,
) -> Result<(StatusCode, Json<UsageLogEntry>), AppError> {
    ensure_owned(&state, &user, subscription_id).await?;

    let entry = state
        .store
        .append_usage(subscription_id, Utc::now())
        .await
        .map_err(|e| {
            record_error("append_usage", "log_usage");
            e
        })?;
    record_usage_logged(state.store.backend_name());

    tracing::info!(
        subscription_id = %subscription_id,
        log_id = %entry.log_id,
        "Usage logged"
    );

    Ok((StatusCode::CREATED, Json(entry)))
}

/// Usage history, newest first.
pub async fn list_usage(
    State(state): State<AppState>,
    user: UserContext,
    Path(subscription_id): Path<Uuid>,
) -> Result<Json<Vec<UsageLogEntry>>, AppError> {
    ensure_owned(&state, &user, subscription_id).await?;

    let entries = state.store.list_usage(subscription_id).await?;
    Ok(Json(entries))
}
