//! Notification API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::Notification;
use crate::utils::{AppError, AppResult};

/// GET /api/notifications - 当前用户最近通知
pub async fn list_own(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<Notification>>> {
    Ok(Json(state.notify.list(&user.id).await?))
}

/// PUT /api/notifications/:id/read - 标记已读 (仅限本人的通知)
pub async fn mark_read(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    let updated = state.notify.mark_read(&user.id, &id).await?;
    if !updated {
        return Err(AppError::not_found(format!("Notification {id} not found")));
    }
    Ok(Json(true))
}
