use axum::extract::State;
use serde_json::json;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::extract::ApiPath;
use crate::api::middleware::AuthUser;
use crate::api::response::{ApiResponse, ApiResult};
use crate::domain::notification::Notification;
use crate::state::AppState;

/// Other users' notifications are reported as missing
async fn owned(state: &AppState, user: &AuthUser, id: Uuid) -> Result<Notification, ApiError> {
    state
        .notifications
        .find_by_id(id)
        .await?
        .filter(|n| n.account_id == user.id)
        .ok_or_else(|| ApiError::not_found("Notification not found"))
}

/// GET /api/v1/user/notifications
pub async fn list(State(state): State<AppState>, user: AuthUser) -> ApiResult {
    let notifications = state.notifications.list_for(user.id).await?;
    Ok(ApiResponse::ok(
        "Notifications fetched",
        json!({ "notifications": notifications }),
    ))
}

/// GET /api/v1/user/notifications/:id
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult {
    let notification = owned(&state, &user, id).await?;
    Ok(ApiResponse::ok(
        "Notification fetched",
        json!({ "notification": notification }),
    ))
}

/// PATCH /api/v1/user/notifications/:id/mark-as-read
pub async fn mark_as_read(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult {
    let mut notification = owned(&state, &user, id).await?;
    state.notifications.mark_read(notification.id).await?;
    notification.read = true;
    Ok(ApiResponse::ok(
        "Notification marked as read",
        json!({ "notification": notification }),
    ))
}

/// DELETE /api/v1/user/notifications/:id
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult {
    let notification = owned(&state, &user, id).await?;
    state.notifications.delete(notification.id).await?;
    Ok(ApiResponse::ok("Notification deleted", json!({})))
}
