use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::models::{group, member, user, Member, MemberSearch, MemberUpdate, MemberWithGroup, NewMember};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, GroupPath};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MemberPath {
    pub id: i32,
}

#[derive(Debug, Deserialize)]
pub struct MembershipPath {
    pub group_id: i32,
    pub username: String,
}

/// GET /members?username=&group_id= => [member, ...]
///
/// Authorization required: none
pub async fn list(
    State(state): State<AppState>,
    Query(search): Query<MemberSearch>,
) -> ApiResult<Vec<Member>> {
    let members = member::find_all(&state.pool, &search).await?;
    Ok(ApiResponse::success(members))
}

/// GET /members/:id => member with its group
///
/// Authorization required: none
pub async fn get(
    State(state): State<AppState>,
    Path(path): Path<MemberPath>,
) -> ApiResult<MemberWithGroup> {
    let member = member::get(&state.pool, path.id).await?;
    Ok(ApiResponse::success(member))
}

/// POST /groups/:group_id/members { username } => member
///
/// Authorization required: group admin
pub async fn add(
    State(state): State<AppState>,
    Path(path): Path<GroupPath>,
    Json(body): Json<NewMember>,
) -> ApiResult<Member> {
    // Both must exist before the membership row is written
    let user = user::get(&state.pool, &body.username).await?;
    let group = group::get(&state.pool, path.group_id).await?;

    let member = member::create(&state.pool, &user.username, group.id).await?;
    tracing::info!("'{}' added to group {} (admin: {})", member.username, group.id, member.admin);
    Ok(ApiResponse::created(member))
}

/// PATCH /groups/:group_id/members/:username { is_group_admin? } => member
///
/// Authorization required: group admin
pub async fn update(
    State(state): State<AppState>,
    Path(path): Path<MembershipPath>,
    Json(body): Json<MemberUpdate>,
) -> ApiResult<Member> {
    body.validate().map_err(ApiError::bad_request)?;

    let member = member::update(&state.pool, &path.username, path.group_id, &body).await?;
    Ok(ApiResponse::success(member))
}

/// DELETE /groups/:group_id/members/:username => { deleted: username }
///
/// Authorization required: group admin
pub async fn remove(
    State(state): State<AppState>,
    Path(path): Path<MembershipPath>,
) -> ApiResult<Value> {
    member::remove(&state.pool, &path.username, path.group_id).await?;
    Ok(ApiResponse::success(json!({ "deleted": path.username })))
}

/// DELETE /members/:id => { deleted: id }
///
/// Authorization required: site admin
pub async fn remove_by_id(
    State(state): State<AppState>,
    Path(path): Path<MemberPath>,
) -> ApiResult<Value> {
    member::remove_by_id(&state.pool, path.id).await?;
    Ok(ApiResponse::success(json!({ "deleted": path.id })))
}
