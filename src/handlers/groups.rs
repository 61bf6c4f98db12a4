use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::auth::Identity;
use crate::database::models::{group, Group, GroupSearch, GroupUpdate, NewGroup};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, GroupPath};
use crate::state::AppState;

/// POST /groups { title, description?, target_goal } => group
///
/// The caller becomes the group's first admin member.
///
/// Authorization required: logged in
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<NewGroup>,
) -> ApiResult<Group> {
    body.validate().map_err(ApiError::bad_request)?;

    let group = group::create(&state.pool, &body, &identity.username).await?;
    Ok(ApiResponse::created(group))
}

/// GET /groups?title=&title_like= => [group, ...]
///
/// Authorization required: none
pub async fn list(
    State(state): State<AppState>,
    Query(search): Query<GroupSearch>,
) -> ApiResult<Vec<Group>> {
    let groups = group::find_all(&state.pool, &search).await?;
    Ok(ApiResponse::success(groups))
}

/// GET /groups/:group_id => group
///
/// Authorization required: none
pub async fn get(State(state): State<AppState>, Path(path): Path<GroupPath>) -> ApiResult<Group> {
    let group = group::get(&state.pool, path.group_id).await?;
    Ok(ApiResponse::success(group))
}

/// PATCH /groups/:group_id { title?, description?, target_goal? } => group
///
/// Authorization required: group admin
pub async fn update(
    State(state): State<AppState>,
    Path(path): Path<GroupPath>,
    Json(body): Json<GroupUpdate>,
) -> ApiResult<Group> {
    body.validate().map_err(ApiError::bad_request)?;

    let group = group::update(&state.pool, path.group_id, &body).await?;
    Ok(ApiResponse::success(group))
}

/// DELETE /groups/:group_id => { deleted: id }
///
/// Authorization required: group admin
pub async fn remove(State(state): State<AppState>, Path(path): Path<GroupPath>) -> ApiResult<Value> {
    group::remove(&state.pool, path.group_id).await?;
    Ok(ApiResponse::success(json!({ "deleted": path.group_id })))
}
