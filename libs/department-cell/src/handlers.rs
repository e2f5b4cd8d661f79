use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{CreateDepartmentRequest, DepartmentError};
use crate::services::department::DepartmentService;

fn map_error(err: DepartmentError) -> AppError {
    match err {
        DepartmentError::NotFound => AppError::NotFound("Department not found".to_string()),
        DepartmentError::Database(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn get_departments(State(state): State<Arc<AppConfig>>) -> Result<Json<Value>, AppError> {
    let service = DepartmentService::new(&state);
    let departments = service.list_departments().await.map_err(map_error)?;

    Ok(Json(json!(departments)))
}

#[axum::debug_handler]
pub async fn create_department(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<CreateDepartmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = DepartmentService::new(&state);
    let department = service.create_department(request).await.map_err(map_error)?;

    Ok(Json(json!({
        "message": "Department created successfully",
        "department_id": department.department_id
    })))
}

#[axum::debug_handler]
pub async fn delete_department(
    State(state): State<Arc<AppConfig>>,
    Path(department_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = DepartmentService::new(&state);
    service.delete_department(department_id).await.map_err(map_error)?;

    Ok(Json(json!({ "message": "Department deleted successfully" })))
}
