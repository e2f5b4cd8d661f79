use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub appointment_id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub duration_minutes: Option<i32>,
    pub appointment_type: Option<String>,
    pub status: AppointmentStatus,
    pub reason_for_visit: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = AppointmentError;

    /// Case-insensitive; anything outside the three known states is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(AppointmentError::InvalidStatus(other.to_string())),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

/// Full creation payload used by the admin/doctor path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub appointment_date: Option<NaiveDate>,
    pub appointment_time: Option<NaiveTime>,
    pub duration_minutes: Option<i32>,
    pub appointment_type: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub reason_for_visit: Option<String>,
    pub notes: Option<String>,
}

/// Self-booking payload. Patient callers never supply `patient_id`; it is
/// taken from the linked patient record in their token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSlotRequest {
    pub doctor_id: i64,
    pub patient_id: Option<i64>,
    pub appointment_date: Option<NaiveDate>,
    pub appointment_time: Option<NaiveTime>,
    pub duration_minutes: Option<i32>,
    pub appointment_type: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub reason_for_visit: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub appointment_date: Option<NaiveDate>,
    pub appointment_time: Option<NaiveTime>,
    pub duration_minutes: Option<i32>,
    pub appointment_type: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub reason_for_visit: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: String,
}

/// Answer for the slot listing operation. `booked_slots` and
/// `available_slots` partition `all_slots`; order follows the candidate grid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotAvailability {
    pub doctor_id: i64,
    pub date: NaiveDate,
    pub all_slots: Vec<String>,
    pub booked_slots: Vec<String>,
    pub available_slots: Vec<String>,
}

/// Trimmed row returned by the per-doctor day listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorDayAppointment {
    pub appointment_time: NaiveTime,
    pub appointment_date: NaiveDate,
    pub status: AppointmentStatus,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("This time slot is already booked")]
    SlotTaken,

    #[error("You already have an appointment with this doctor on this date")]
    DuplicateForDay,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid status value: {0}")]
    InvalidStatus(String),

    #[error("No patient record is linked to this account")]
    NoLinkedPatient,

    #[error("Database error: {0}")]
    Database(String),
}
