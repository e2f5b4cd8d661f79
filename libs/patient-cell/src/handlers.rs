use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{CreatePatientRequest, PatientError, UpdatePatientRequest};
use crate::services::patient::PatientService;

fn map_error(err: PatientError) -> AppError {
    match err {
        PatientError::NotFound => AppError::NotFound("Patient not found".to_string()),
        PatientError::Validation(msg) => AppError::BadRequest(msg),
        PatientError::Database(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn get_patients(State(state): State<Arc<AppConfig>>) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&state);
    let patients = service.list_patients().await.map_err(map_error)?;

    Ok(Json(json!(patients)))
}

#[axum::debug_handler]
pub async fn get_patient_by_id(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&state);
    let patient = service.get_patient(patient_id).await.map_err(map_error)?;

    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn create_patient(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<CreatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&state);
    let patient = service.create_patient(request).await.map_err(map_error)?;

    Ok(Json(json!({
        "message": "Patient created",
        "patient_id": patient.patient_id
    })))
}

#[axum::debug_handler]
pub async fn update_patient(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<i64>,
    Json(request): Json<UpdatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&state);
    service.update_patient(patient_id, request).await.map_err(map_error)?;

    Ok(Json(json!({ "message": "Patient updated successfully" })))
}

#[axum::debug_handler]
pub async fn delete_patient(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&state);
    service.delete_patient(patient_id).await.map_err(map_error)?;

    Ok(Json(json!({ "message": "Patient deleted successfully" })))
}

#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&state);
    let appointments = service
        .appointments_for_patient(patient_id)
        .await
        .map_err(map_error)?;

    Ok(Json(json!(appointments)))
}

#[axum::debug_handler]
pub async fn get_patient_doctors(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&state);
    let doctors = service.doctors_for_patient(patient_id).await.map_err(map_error)?;

    Ok(Json(json!(doctors)))
}

#[axum::debug_handler]
pub async fn get_patient_stats(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&state);
    let stats = service.patient_stats(patient_id).await.map_err(map_error)?;

    Ok(Json(json!(stats)))
}
