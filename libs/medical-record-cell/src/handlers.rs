use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{CreateMedicalRecordRequest, MedicalRecordError};
use crate::services::record::MedicalRecordService;

fn map_error(err: MedicalRecordError) -> AppError {
    match err {
        MedicalRecordError::NotFound => AppError::NotFound("Medical record not found".to_string()),
        MedicalRecordError::Database(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn create_medical_record(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<CreateMedicalRecordRequest>,
) -> Result<Json<Value>, AppError> {
    let service = MedicalRecordService::new(&state);
    let record = service.create_record(request).await.map_err(map_error)?;

    Ok(Json(json!({
        "message": "Medical record created",
        "record_id": record.record_id
    })))
}

#[axum::debug_handler]
pub async fn get_medical_records(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let service = MedicalRecordService::new(&state);
    let records = service.list_records().await.map_err(map_error)?;

    Ok(Json(json!(records)))
}

#[axum::debug_handler]
pub async fn delete_medical_record(
    State(state): State<Arc<AppConfig>>,
    Path(record_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = MedicalRecordService::new(&state);
    service.delete_record(record_id).await.map_err(map_error)?;

    Ok(Json(json!({ "message": "Medical record deleted successfully" })))
}
