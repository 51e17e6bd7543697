//! Group wallets: groups owned by the caller and their members.
//!
//! Split percentages are stored as given. Nothing checks that a group's
//! members add up to 100.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{AddGroupMemberRequest, CreateGroupRequest},
    middleware::UserContext,
    models::{Group, GroupMember},
    startup::AppState,
};

async fn owned_group(
    state: &AppState,
    user: &UserContext,
    group_id: Uuid,
) -> Result<Group, AppError> {
    state
        .store
        .get_group(user.user_id, group_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Group not found")))
}

pub async fn list_groups(
    State(state): State<AppState>,
    user: UserContext,
) -> Result<Json<Vec<Group>>, AppError> {
    let groups = state.store.list_groups(user.user_id).await?;
    Ok(Json(groups))
}

pub async fn create_group(
    State(state): State<AppState>,
    user: UserContext,
    Json(payload): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Group>), AppError> {
    payload.validate()?;

    let group = state
        .store
        .create_group(&payload.into_input(user.user_id))
        .await?;

    tracing::info!(group_id = %group.group_id, name = %group.name, "Created group");
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn add_member(
    State(state): State<AppState>,
    user: UserContext,
    Path(group_id): Path<Uuid>,
    Json(payload): Json<AddGroupMemberRequest>,
) -> Result<(StatusCode, Json<GroupMember>), AppError> {
    payload.validate()?;
    let group = owned_group(&state, &user, group_id).await?;

    let member = state
        .store
        .add_group_member(&payload.into_input(group.group_id))
        .await?;

    tracing::info!(
        group_id = %group.group_id,
        member_id = %member.member_id,
        split_percentage = %member.split_percentage,
        "Added group member"
    );
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn list_members(
    State(state): State<AppState>,
    user: UserContext,
    Path(group_id): Path<Uuid>,
) -> Result<Json<Vec<GroupMember>>, AppError> {
    let group = owned_group(&state, &user, group_id).await?;
    let members = state.store.list_group_members(group.group_id).await?;
    Ok(Json(members))
}
