//! Subscription CRUD. Every operation is scoped to the caller from `X-User-ID`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{CreateSubscriptionRequest, UpdateSubscriptionRequest},
    middleware::UserContext,
    models::{Subscription, SubscriptionView, UpdateSubscription},
    services::{record_error, record_subscription_operation, record_value_score, scoring},
    startup::AppState,
};

/// List the caller's subscriptions with their value scores.
pub async fn list_subscriptions(
    State(state): State<AppState>,
    user: UserContext,
) -> Result<Json<Vec<SubscriptionView>>, AppError> {
    let subscriptions = state.store.list_subscriptions(user.user_id).await?;

    let views = scoring::score_all(&*state.store, subscriptions, Utc::now())
        .await
        .map_err(|e| {
            record_error("scoring", "list_subscriptions");
            e
        })?;

    for view in &views {
        record_value_score(view.value_score.as_str());
    }
    record_subscription_operation("list");

    tracing::info!(count = views.len(), "Listed subscriptions");
    Ok(Json(views))
}

pub async fn create_subscription(
    State(state): State<AppState>,
    user: UserContext,
    Json(payload): Json<CreateSubscriptionRequest>,
) -> Result<(StatusCode, Json<Subscription>), AppError> {
    payload.validate()?;

    let subscription = state
        .store
        .create_subscription(&payload.into_input(user.user_id))
        .await?;
    record_subscription_operation("create");

    tracing::info!(
        subscription_id = %subscription.subscription_id,
        name = %subscription.name,
        cost = %subscription.cost,
        billing_cycle = %subscription.billing_cycle,
        "Created subscription"
    );

    Ok((StatusCode::CREATED, Json(subscription)))
}

pub async fn get_subscription(
    State(state): State<AppState>,
    user: UserContext,
    Path(subscription_id): Path<Uuid>,
) -> Result<Json<Subscription>, AppError> {
    let subscription = state
        .store
        .get_subscription(user.user_id, subscription_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Subscription not found")))?;

    record_subscription_operation("get");
    Ok(Json(subscription))
}

/// Apply a partial update. An empty body is rejected.
pub async fn update_subscription(
    State(state): State<AppState>,
    user: UserContext,
    Path(subscription_id): Path<Uuid>,
    Json(payload): Json<UpdateSubscriptionRequest>,
) -> Result<Json<Subscription>, AppError> {
    payload.validate()?;

    let update = UpdateSubscription::from(payload);
    if update.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Update must change at least one field"
        )));
    }

    let subscription = state
        .store
        .update_subscription(user.user_id, subscription_id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Subscription not found")))?;
    record_subscription_operation("update");

    tracing::info!(
        subscription_id = %subscription_id,
        is_active = subscription.is_active,
        "Updated subscription"
    );

    Ok(Json(subscription))
}

/// Delete a subscription and its usage history.
pub async fn delete_subscription(
    State(state): State<AppState>,
    user: UserContext,
    Path(subscription_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = state
        .store
        .delete_subscription(user.user_id, subscription_id)
        .await?;

    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Subscription not found")));
    }
    record_subscription_operation("delete");

    tracing::info!(subscription_id = %subscription_id, "Deleted subscription");
    Ok(StatusCode::NO_CONTENT)
}
