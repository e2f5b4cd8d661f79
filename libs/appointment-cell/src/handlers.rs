use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;

use crate::models::{
    AppointmentError, BookSlotRequest, ChangeStatusRequest, CreateAppointmentRequest,
    UpdateAppointmentRequest,
};
use crate::services::booking::BookingService;
use crate::services::slots::SlotService;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct SlotQueryParams {
    pub doctor_id: Option<i64>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct DoctorDateQueryParams {
    pub date: Option<NaiveDate>,
}

fn map_error(err: AppointmentError) -> AppError {
    match err {
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::SlotTaken => {
            AppError::Conflict("This time slot is already booked".to_string())
        }
        AppointmentError::DuplicateForDay => AppError::Conflict(
            "You already have an appointment with this doctor on this date".to_string(),
        ),
        AppointmentError::Validation(msg) => AppError::BadRequest(msg),
        AppointmentError::InvalidStatus(_) => {
            AppError::ValidationError("Invalid status value".to_string())
        }
        AppointmentError::NoLinkedPatient => {
            AppError::Auth("No patient record is linked to this account".to_string())
        }
        AppointmentError::Database(msg) => AppError::Database(msg),
    }
}

// ==============================================================================
// BOOKING HANDLERS
// ==============================================================================

/// Full creation path (admin/doctor screens).
#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);
    let appointment = service
        .create_appointment(&user, request)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "message": "Appointment created successfully",
        "appointment_id": appointment.appointment_id,
        "appointment": appointment
    })))
}

/// Slot admission path: patients book for their linked record, staff may
/// book for an explicit patient.
#[axum::debug_handler]
pub async fn book_slot(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<BookSlotRequest>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);
    let appointment = service.book_slot(&user, request).await.map_err(map_error)?;

    Ok(Json(json!({
        "message": "Appointment booked successfully",
        "appointment_id": appointment.appointment_id
    })))
}

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppConfig>>,
    Query(params): Query<SlotQueryParams>,
) -> Result<Json<Value>, AppError> {
    let (doctor_id, date) = match (params.doctor_id, params.date) {
        (Some(doctor_id), Some(date)) => (doctor_id, date),
        _ => {
            return Err(AppError::BadRequest(
                "doctor_id and date are required".to_string(),
            ))
        }
    };

    let service = SlotService::new(&state);
    let availability = service.list_slots(doctor_id, date).await.map_err(map_error)?;

    Ok(Json(json!({
        "bookedSlots": availability.booked_slots,
        "availableSlots": availability.available_slots,
        "allSlots": availability.all_slots
    })))
}

// ==============================================================================
// LISTING / MUTATION HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_appointments(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);
    let appointments = service.list_appointments().await.map_err(map_error)?;

    Ok(Json(json!(appointments)))
}

#[axum::debug_handler]
pub async fn get_appointments_by_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<i64>,
    Query(params): Query<DoctorDateQueryParams>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);

    // With a date this is the day view; without, the doctor's full history.
    match params.date {
        Some(date) => {
            let appointments = service
                .appointments_for_doctor_on_date(doctor_id, date)
                .await
                .map_err(map_error)?;
            Ok(Json(json!(appointments)))
        }
        None => {
            let appointments = service
                .appointments_for_doctor(doctor_id)
                .await
                .map_err(map_error)?;
            Ok(Json(json!(appointments)))
        }
    }
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<i64>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);
    service
        .update_appointment(appointment_id, request)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "message": "Appointment updated successfully" })))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);
    service
        .delete_appointment(appointment_id)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "message": "Appointment deleted successfully" })))
}

#[axum::debug_handler]
pub async fn change_status(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<i64>,
    Json(request): Json<ChangeStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);
    service
        .change_status(appointment_id, request)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "message": "Status updated successfully" })))
}
