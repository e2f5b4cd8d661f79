use chrono::{NaiveDate, NaiveTime, Utc};
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::postgrest::{PostgrestClient, StorageError};
use shared_models::auth::AuthUser;

use notification_cell::services::notification::NotificationService;

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, BookSlotRequest, ChangeStatusRequest,
    CreateAppointmentRequest, DoctorDayAppointment, UpdateAppointmentRequest,
};

pub struct BookingService {
    db: PostgrestClient,
    notifications: NotificationService,
    admin_user_id: i64,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
            notifications: NotificationService::new(config),
            admin_user_id: config.admin_user_id,
        }
    }

    /// Self-booking admission path. Two existence checks run before the
    /// insert; the storage layer's unique index on (doctor, date, time) for
    /// non-cancelled rows backstops them, so a concurrent double-book
    /// surfaces as a storage conflict rather than a second row.
    pub async fn book_slot(
        &self,
        caller: &AuthUser,
        request: BookSlotRequest,
    ) -> Result<Appointment, AppointmentError> {
        let (date, time) = require_date_and_time(request.appointment_date, request.appointment_time)?;

        let patient_id = if caller.is_patient() {
            caller
                .linked_patient_id
                .ok_or(AppointmentError::NoLinkedPatient)?
        } else {
            request
                .patient_id
                .ok_or_else(|| AppointmentError::Validation("Patient id is required".to_string()))?
        };

        info!(
            "Booking slot for patient {} with doctor {} on {} at {}",
            patient_id, request.doctor_id, date, time
        );

        // Same patient, same doctor, same day - rejected regardless of time.
        if self
            .appointments_exist(&format!(
                "patient_id=eq.{}&doctor_id=eq.{}&appointment_date=eq.{}",
                patient_id, request.doctor_id, date
            ))
            .await?
        {
            return Err(AppointmentError::DuplicateForDay);
        }

        // Exact slot already taken for this doctor.
        if self
            .appointments_exist(&format!(
                "doctor_id=eq.{}&appointment_date=eq.{}&appointment_time=eq.{}",
                request.doctor_id,
                date,
                urlencoding::encode(&time.format("%H:%M:%S").to_string())
            ))
            .await?
        {
            return Err(AppointmentError::SlotTaken);
        }

        let status = request.status.unwrap_or(AppointmentStatus::Scheduled);
        let appointment = self
            .insert_appointment(json!({
                "patient_id": patient_id,
                "doctor_id": request.doctor_id,
                "appointment_date": date,
                "appointment_time": time.format("%H:%M:%S").to_string(),
                "duration_minutes": request.duration_minutes,
                "appointment_type": request.appointment_type,
                "status": status.to_string(),
                "reason_for_visit": request.reason_for_visit,
                "notes": request.notes,
                "created_at": Utc::now().to_rfc3339()
            }))
            .await?;

        self.notify_created(&caller.role, &appointment).await;

        info!("Appointment {} booked successfully", appointment.appointment_id);
        Ok(appointment)
    }

    /// Full creation path used from the admin/doctor screens. No pre-checks
    /// here (matching the coarse-grained management flow); the unique index
    /// still rejects an exact slot duplicate.
    pub async fn create_appointment(
        &self,
        caller: &AuthUser,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let (date, time) = require_date_and_time(request.appointment_date, request.appointment_time)?;

        let status = request.status.unwrap_or(AppointmentStatus::Scheduled);
        let appointment = self
            .insert_appointment(json!({
                "patient_id": request.patient_id,
                "doctor_id": request.doctor_id,
                "appointment_date": date,
                "appointment_time": time.format("%H:%M:%S").to_string(),
                "duration_minutes": request.duration_minutes,
                "appointment_type": request.appointment_type,
                "status": status.to_string(),
                "reason_for_visit": request.reason_for_visit,
                "notes": request.notes,
                "created_at": Utc::now().to_rfc3339()
            }))
            .await?;

        self.notify_created(&caller.role, &appointment).await;

        info!("Appointment {} created successfully", appointment.appointment_id);
        Ok(appointment)
    }

    pub async fn get_appointment(&self, appointment_id: i64) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);

        let path = format!("/rest/v1/appointments?appointment_id=eq.{}", appointment_id);
        let result: Vec<Value> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        let row = result.first().ok_or(AppointmentError::NotFound)?;

        serde_json::from_value(row.clone())
            .map_err(|e| AppointmentError::Database(format!("Failed to parse appointment: {}", e)))
    }

    pub async fn list_appointments(&self) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Fetching all appointments");

        let path = "/rest/v1/appointments?order=appointment_date.desc,appointment_time.desc";
        self.fetch_appointments(path).await
    }

    pub async fn appointments_for_doctor(
        &self,
        doctor_id: i64,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Fetching appointments for doctor: {}", doctor_id);

        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&order=appointment_date.desc,appointment_time.desc",
            doctor_id
        );
        self.fetch_appointments(&path).await
    }

    /// Day view for a doctor; only the fields the schedule screen needs.
    pub async fn appointments_for_doctor_on_date(
        &self,
        doctor_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<DoctorDayAppointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&appointment_date=eq.{}&select=appointment_time,appointment_date,status",
            doctor_id, date
        );
        let result: Vec<Value> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<DoctorDayAppointment>, _>>()
            .map_err(|e| AppointmentError::Database(format!("Failed to parse appointments: {}", e)))
    }

    pub async fn update_appointment(
        &self,
        appointment_id: i64,
        request: UpdateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Updating appointment: {}", appointment_id);

        let mut changes = Map::new();
        if let Some(date) = request.appointment_date {
            changes.insert("appointment_date".to_string(), json!(date));
        }
        if let Some(time) = request.appointment_time {
            changes.insert(
                "appointment_time".to_string(),
                json!(time.format("%H:%M:%S").to_string()),
            );
        }
        if let Some(duration) = request.duration_minutes {
            changes.insert("duration_minutes".to_string(), json!(duration));
        }
        if let Some(appointment_type) = request.appointment_type {
            changes.insert("appointment_type".to_string(), json!(appointment_type));
        }
        if let Some(status) = request.status {
            changes.insert("status".to_string(), json!(status.to_string()));
        }
        if let Some(reason) = request.reason_for_visit {
            changes.insert("reason_for_visit".to_string(), json!(reason));
        }
        if let Some(notes) = request.notes {
            changes.insert("notes".to_string(), json!(notes));
        }

        if changes.is_empty() {
            return Err(AppointmentError::Validation("Nothing to update".to_string()));
        }

        let path = format!("/rest/v1/appointments?appointment_id=eq.{}", appointment_id);
        let updated = self
            .db
            .update_returning(&path, Value::Object(changes))
            .await
            .map_err(|e| match e {
                StorageError::Conflict(_) => AppointmentError::SlotTaken,
                other => AppointmentError::Database(other.to_string()),
            })?;

        let row = updated.first().ok_or(AppointmentError::NotFound)?;

        serde_json::from_value(row.clone())
            .map_err(|e| AppointmentError::Database(format!("Failed to parse appointment: {}", e)))
    }

    pub async fn delete_appointment(&self, appointment_id: i64) -> Result<(), AppointmentError> {
        debug!("Deleting appointment: {}", appointment_id);

        let path = format!("/rest/v1/appointments?appointment_id=eq.{}", appointment_id);
        let deleted = self
            .db
            .delete_returning(&path)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        if deleted.is_empty() {
            return Err(AppointmentError::NotFound);
        }

        Ok(())
    }

    /// Status is normalized to lower-case and must be one of the three known
    /// states. Any state may follow any other.
    pub async fn change_status(
        &self,
        appointment_id: i64,
        request: ChangeStatusRequest,
    ) -> Result<AppointmentStatus, AppointmentError> {
        let status: AppointmentStatus = request.status.parse()?;

        let path = format!("/rest/v1/appointments?appointment_id=eq.{}", appointment_id);
        let updated = self
            .db
            .update_returning(&path, json!({ "status": status.to_string() }))
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        if updated.is_empty() {
            return Err(AppointmentError::NotFound);
        }

        info!("Appointment {} status changed to {}", appointment_id, status);
        Ok(status)
    }

    // ==========================================================================
    // PRIVATE HELPERS
    // ==========================================================================

    async fn appointments_exist(&self, filter: &str) -> Result<bool, AppointmentError> {
        let path = format!("/rest/v1/appointments?{}&select=appointment_id", filter);
        let result: Vec<Value> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        Ok(!result.is_empty())
    }

    async fn insert_appointment(&self, row: Value) -> Result<Appointment, AppointmentError> {
        let result = self.db.insert_returning("appointments", row).await.map_err(|e| match e {
            // Unique index on (doctor, date, time) for non-cancelled rows:
            // a 409 here is the slot-taken signal, not a server fault.
            StorageError::Conflict(_) => AppointmentError::SlotTaken,
            other => AppointmentError::Database(other.to_string()),
        })?;

        let row = result
            .first()
            .ok_or_else(|| AppointmentError::Database("Failed to create appointment".to_string()))?;

        serde_json::from_value(row.clone())
            .map_err(|e| AppointmentError::Database(format!("Failed to parse created appointment: {}", e)))
    }

    /// Fire-and-forget fan-out; a failed notification never fails a booking.
    async fn notify_created(&self, creator_role: &str, appointment: &Appointment) {
        if let Err(e) = self
            .notifications
            .appointment_booked(
                creator_role,
                appointment.doctor_id,
                appointment.patient_id,
                appointment.appointment_date,
                self.admin_user_id,
            )
            .await
        {
            warn!(
                "Notification fan-out failed for appointment {}: {}",
                appointment.appointment_id, e
            );
        }
    }

    async fn fetch_appointments(&self, path: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let result: Vec<Value> = self
            .db
            .request(Method::GET, path, None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| AppointmentError::Database(format!("Failed to parse appointments: {}", e)))
    }
}

fn require_date_and_time(
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
) -> Result<(NaiveDate, NaiveTime), AppointmentError> {
    match (date, time) {
        (Some(date), Some(time)) => Ok((date, time)),
        _ => Err(AppointmentError::Validation(
            "Date and time are required".to_string(),
        )),
    }
}
