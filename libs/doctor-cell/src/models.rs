use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub doctor_id: i64,
    pub employee_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub specialization: Option<String>,
    pub license_number: Option<String>,
    pub department_id: Option<i64>,
    pub consultation_fee: Option<f64>,
    pub experience_years: Option<i32>,
    /// Optional per-doctor slot window; the booking grid falls back to the
    /// fixed clinic hours when unset.
    pub available_from: Option<NaiveTime>,
    pub available_to: Option<NaiveTime>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDoctorRequest {
    pub employee_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub specialization: Option<String>,
    pub license_number: Option<String>,
    pub department_id: Option<i64>,
    pub consultation_fee: Option<f64>,
    pub experience_years: Option<i32>,
    pub available_from: Option<NaiveTime>,
    pub available_to: Option<NaiveTime>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDoctorRequest {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub specialization: Option<String>,
    pub license_number: Option<String>,
    pub department_id: Option<i64>,
    pub consultation_fee: Option<f64>,
    pub experience_years: Option<i32>,
    pub available_from: Option<NaiveTime>,
    pub available_to: Option<NaiveTime>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorStats {
    pub total_appointments: i64,
    pub scheduled_appointments: i64,
    pub completed_appointments: i64,
    pub cancelled_appointments: i64,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}
