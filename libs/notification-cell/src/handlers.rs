use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{CreateNotificationRequest, NotificationError};
use crate::services::notification::NotificationService;

fn map_error(err: NotificationError) -> AppError {
    match err {
        NotificationError::NotFound => AppError::NotFound("Notification not found".to_string()),
        NotificationError::Database(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn get_notifications_by_user(
    State(state): State<Arc<AppConfig>>,
    Path(user_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = NotificationService::new(&state);
    let notifications = service.list_for_user(user_id).await.map_err(map_error)?;

    Ok(Json(json!(notifications)))
}

#[axum::debug_handler]
pub async fn create_notification(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<CreateNotificationRequest>,
) -> Result<Json<Value>, AppError> {
    let service = NotificationService::new(&state);
    let notification = service
        .create(request.user_id, &request.message)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "message": "Notification created",
        "notification": notification
    })))
}

#[axum::debug_handler]
pub async fn mark_notification_read(
    State(state): State<Arc<AppConfig>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = NotificationService::new(&state);
    service.mark_read(id).await.map_err(map_error)?;

    Ok(Json(json!({ "message": "Notification marked as read" })))
}

#[axum::debug_handler]
pub async fn mark_all_notifications_read(
    State(state): State<Arc<AppConfig>>,
    Path(user_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = NotificationService::new(&state);
    service.mark_all_read(user_id).await.map_err(map_error)?;

    Ok(Json(json!({ "message": "Notifications marked as read" })))
}
