use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::postgrest::PostgrestClient;

use crate::models::{CreateDoctorRequest, Doctor, DoctorError, DoctorStats, UpdateDoctorRequest};

pub struct DoctorService {
    db: PostgrestClient,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    pub async fn list_doctors(&self) -> Result<Vec<Doctor>, DoctorError> {
        debug!("Fetching all doctors");

        let result: Vec<Value> = self
            .db
            .request(Method::GET, "/rest/v1/doctors?order=last_name.asc", None)
            .await
            .map_err(|e| DoctorError::Database(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Doctor>, _>>()
            .map_err(|e| DoctorError::Database(format!("Failed to parse doctors: {}", e)))
    }

    pub async fn create_doctor(&self, request: CreateDoctorRequest) -> Result<Doctor, DoctorError> {
        debug!("Creating doctor: {} {}", request.first_name, request.last_name);

        let row = json!({
            "employee_id": request.employee_id,
            "first_name": request.first_name,
            "last_name": request.last_name,
            "email": request.email,
            "phone": request.phone,
            "specialization": request.specialization,
            "license_number": request.license_number,
            "department_id": request.department_id,
            "consultation_fee": request.consultation_fee,
            "experience_years": request.experience_years,
            "available_from": request.available_from.map(|t| t.format("%H:%M:%S").to_string()),
            "available_to": request.available_to.map(|t| t.format("%H:%M:%S").to_string()),
            "created_at": Utc::now().to_rfc3339()
        });

        let result = self
            .db
            .insert_returning("doctors", row)
            .await
            .map_err(|e| DoctorError::Database(e.to_string()))?;

        let created = result
            .first()
            .ok_or_else(|| DoctorError::Database("Failed to create doctor".to_string()))?;

        serde_json::from_value(created.clone())
            .map_err(|e| DoctorError::Database(format!("Failed to parse doctor: {}", e)))
    }

    pub async fn update_doctor(
        &self,
        doctor_id: i64,
        request: UpdateDoctorRequest,
    ) -> Result<Doctor, DoctorError> {
        debug!("Updating doctor: {}", doctor_id);

        let mut changes = Map::new();
        if let Some(phone) = request.phone {
            changes.insert("phone".to_string(), json!(phone));
        }
        if let Some(email) = request.email {
            changes.insert("email".to_string(), json!(email));
        }
        if let Some(specialization) = request.specialization {
            changes.insert("specialization".to_string(), json!(specialization));
        }
        if let Some(license_number) = request.license_number {
            changes.insert("license_number".to_string(), json!(license_number));
        }
        if let Some(department_id) = request.department_id {
            changes.insert("department_id".to_string(), json!(department_id));
        }
        if let Some(fee) = request.consultation_fee {
            changes.insert("consultation_fee".to_string(), json!(fee));
        }
        if let Some(years) = request.experience_years {
            changes.insert("experience_years".to_string(), json!(years));
        }
        if let Some(from) = request.available_from {
            changes.insert(
                "available_from".to_string(),
                json!(from.format("%H:%M:%S").to_string()),
            );
        }
        if let Some(to) = request.available_to {
            changes.insert(
                "available_to".to_string(),
                json!(to.format("%H:%M:%S").to_string()),
            );
        }

        if changes.is_empty() {
            return Err(DoctorError::Validation("Nothing to update".to_string()));
        }

        let path = format!("/rest/v1/doctors?doctor_id=eq.{}", doctor_id);
        let updated = self
            .db
            .update_returning(&path, Value::Object(changes))
            .await
            .map_err(|e| DoctorError::Database(e.to_string()))?;

        let row = updated.first().ok_or(DoctorError::NotFound)?;

        serde_json::from_value(row.clone())
            .map_err(|e| DoctorError::Database(format!("Failed to parse doctor: {}", e)))
    }

    pub async fn delete_doctor(&self, doctor_id: i64) -> Result<(), DoctorError> {
        debug!("Deleting doctor: {}", doctor_id);

        let path = format!("/rest/v1/doctors?doctor_id=eq.{}", doctor_id);
        let deleted = self
            .db
            .delete_returning(&path)
            .await
            .map_err(|e| DoctorError::Database(e.to_string()))?;

        if deleted.is_empty() {
            return Err(DoctorError::NotFound);
        }

        Ok(())
    }

    pub async fn appointments_for_doctor(&self, doctor_id: i64) -> Result<Vec<Value>, DoctorError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&order=appointment_date.desc,appointment_time.desc",
            doctor_id
        );

        self.db
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DoctorError::Database(e.to_string()))
    }

    /// Distinct patients this doctor has appointments with, resolved in two
    /// steps: appointment rows first, then the patient rows themselves.
    pub async fn patients_for_doctor(&self, doctor_id: i64) -> Result<Vec<Value>, DoctorError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&select=patient_id",
            doctor_id
        );
        let appointments: Vec<Value> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DoctorError::Database(e.to_string()))?;

        let mut patient_ids: Vec<i64> = appointments
            .iter()
            .filter_map(|row| row["patient_id"].as_i64())
            .collect();
        patient_ids.sort_unstable();
        patient_ids.dedup();

        if patient_ids.is_empty() {
            return Ok(vec![]);
        }

        let id_list = patient_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let path = format!("/rest/v1/patients?patient_id=in.({})", id_list);

        self.db
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DoctorError::Database(e.to_string()))
    }

    pub async fn doctor_stats(&self, doctor_id: i64) -> Result<DoctorStats, DoctorError> {
        let base = format!("/rest/v1/appointments?doctor_id=eq.{}", doctor_id);

        let total = self.count(&base).await?;
        let scheduled = self.count(&format!("{}&status=eq.scheduled", base)).await?;
        let completed = self.count(&format!("{}&status=eq.completed", base)).await?;
        let cancelled = self.count(&format!("{}&status=eq.cancelled", base)).await?;

        Ok(DoctorStats {
            total_appointments: total,
            scheduled_appointments: scheduled,
            completed_appointments: completed,
            cancelled_appointments: cancelled,
        })
    }

    async fn count(&self, path: &str) -> Result<i64, DoctorError> {
        self.db
            .count(path)
            .await
            .map_err(|e| DoctorError::Database(e.to_string()))
    }
}
