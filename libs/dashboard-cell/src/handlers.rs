use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::DashboardError;
use crate::services::stats::DashboardService;

fn map_error(err: DashboardError) -> AppError {
    match err {
        DashboardError::Database(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn get_dashboard_stats(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let service = DashboardService::new(&state);
    let stats = service.dashboard_stats().await.map_err(map_error)?;

    Ok(Json(json!(stats)))
}
