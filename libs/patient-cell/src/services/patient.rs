use std::collections::HashMap;

use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::postgrest::PostgrestClient;

use crate::models::{
    CreatePatientRequest, Patient, PatientError, PatientListing, PatientStats, UpdatePatientRequest,
};

pub struct PatientService {
    db: PostgrestClient,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    /// All patients, each carrying the most recent diagnosis from their
    /// medical records. Two reads, joined here rather than in storage.
    pub async fn list_patients(&self) -> Result<Vec<PatientListing>, PatientError> {
        debug!("Fetching all patients");

        let result: Vec<Value> = self
            .db
            .request(Method::GET, "/rest/v1/patients?order=last_name.asc", None)
            .await
            .map_err(|e| PatientError::Database(e.to_string()))?;

        let patients: Vec<Patient> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Patient>, _>>()
            .map_err(|e| PatientError::Database(format!("Failed to parse patients: {}", e)))?;

        let records: Vec<Value> = self
            .db
            .request(
                Method::GET,
                "/rest/v1/medical_records?select=patient_id,diagnosis,visit_date&order=visit_date.desc",
                None,
            )
            .await
            .map_err(|e| PatientError::Database(e.to_string()))?;

        // Records arrive newest-first, so the first diagnosis per patient wins.
        let mut latest: HashMap<i64, String> = HashMap::new();
        for record in &records {
            if let (Some(patient_id), Some(diagnosis)) =
                (record["patient_id"].as_i64(), record["diagnosis"].as_str())
            {
                latest.entry(patient_id).or_insert_with(|| diagnosis.to_string());
            }
        }

        Ok(patients
            .into_iter()
            .map(|patient| {
                let latest_diagnosis = latest.get(&patient.patient_id).cloned();
                PatientListing {
                    patient,
                    latest_diagnosis,
                }
            })
            .collect())
    }

    pub async fn get_patient(&self, patient_id: i64) -> Result<Patient, PatientError> {
        debug!("Fetching patient: {}", patient_id);

        let path = format!("/rest/v1/patients?patient_id=eq.{}", patient_id);
        let result: Vec<Value> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| PatientError::Database(e.to_string()))?;

        let row = result.first().ok_or(PatientError::NotFound)?;

        serde_json::from_value(row.clone())
            .map_err(|e| PatientError::Database(format!("Failed to parse patient: {}", e)))
    }

    pub async fn create_patient(&self, request: CreatePatientRequest) -> Result<Patient, PatientError> {
        debug!("Creating patient: {} {}", request.first_name, request.last_name);

        let row = json!({
            "patient_number": request.patient_number,
            "first_name": request.first_name,
            "last_name": request.last_name,
            "date_of_birth": request.date_of_birth,
            "gender": request.gender,
            "blood_type": request.blood_type,
            "phone": request.phone,
            "email": request.email,
            "address": request.address,
            "emergency_contact_name": request.emergency_contact_name,
            "emergency_contact_phone": request.emergency_contact_phone,
            "insurance_provider": request.insurance_provider,
            "insurance_policy_number": request.insurance_policy_number,
            "allergies": request.allergies,
            "created_at": Utc::now().to_rfc3339()
        });

        let result = self
            .db
            .insert_returning("patients", row)
            .await
            .map_err(|e| PatientError::Database(e.to_string()))?;

        let created = result
            .first()
            .ok_or_else(|| PatientError::Database("Failed to create patient".to_string()))?;

        serde_json::from_value(created.clone())
            .map_err(|e| PatientError::Database(format!("Failed to parse patient: {}", e)))
    }

    pub async fn update_patient(
        &self,
        patient_id: i64,
        request: UpdatePatientRequest,
    ) -> Result<Patient, PatientError> {
        debug!("Updating patient: {}", patient_id);

        let mut changes = Map::new();
        if let Some(phone) = request.phone {
            changes.insert("phone".to_string(), json!(phone));
        }
        if let Some(email) = request.email {
            changes.insert("email".to_string(), json!(email));
        }
        if let Some(address) = request.address {
            changes.insert("address".to_string(), json!(address));
        }
        if let Some(name) = request.emergency_contact_name {
            changes.insert("emergency_contact_name".to_string(), json!(name));
        }
        if let Some(phone) = request.emergency_contact_phone {
            changes.insert("emergency_contact_phone".to_string(), json!(phone));
        }
        if let Some(provider) = request.insurance_provider {
            changes.insert("insurance_provider".to_string(), json!(provider));
        }
        if let Some(policy) = request.insurance_policy_number {
            changes.insert("insurance_policy_number".to_string(), json!(policy));
        }
        if let Some(allergies) = request.allergies {
            changes.insert("allergies".to_string(), json!(allergies));
        }

        if changes.is_empty() {
            return Err(PatientError::Validation("Nothing to update".to_string()));
        }

        let path = format!("/rest/v1/patients?patient_id=eq.{}", patient_id);
        let updated = self
            .db
            .update_returning(&path, Value::Object(changes))
            .await
            .map_err(|e| PatientError::Database(e.to_string()))?;

        let row = updated.first().ok_or(PatientError::NotFound)?;

        serde_json::from_value(row.clone())
            .map_err(|e| PatientError::Database(format!("Failed to parse patient: {}", e)))
    }

    pub async fn delete_patient(&self, patient_id: i64) -> Result<(), PatientError> {
        debug!("Deleting patient: {}", patient_id);

        let path = format!("/rest/v1/patients?patient_id=eq.{}", patient_id);
        let deleted = self
            .db
            .delete_returning(&path)
            .await
            .map_err(|e| PatientError::Database(e.to_string()))?;

        if deleted.is_empty() {
            return Err(PatientError::NotFound);
        }

        Ok(())
    }

    pub async fn appointments_for_patient(&self, patient_id: i64) -> Result<Vec<Value>, PatientError> {
        let path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&order=appointment_date.desc,appointment_time.desc",
            patient_id
        );

        self.db
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| PatientError::Database(e.to_string()))
    }

    /// Distinct doctors this patient has seen or is scheduled with.
    pub async fn doctors_for_patient(&self, patient_id: i64) -> Result<Vec<Value>, PatientError> {
        let path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&select=doctor_id",
            patient_id
        );
        let appointments: Vec<Value> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| PatientError::Database(e.to_string()))?;

        let mut doctor_ids: Vec<i64> = appointments
            .iter()
            .filter_map(|row| row["doctor_id"].as_i64())
            .collect();
        doctor_ids.sort_unstable();
        doctor_ids.dedup();

        if doctor_ids.is_empty() {
            return Ok(vec![]);
        }

        let id_list = doctor_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let path = format!("/rest/v1/doctors?doctor_id=in.({})", id_list);

        self.db
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| PatientError::Database(e.to_string()))
    }

    pub async fn patient_stats(&self, patient_id: i64) -> Result<PatientStats, PatientError> {
        let base = format!("/rest/v1/appointments?patient_id=eq.{}", patient_id);
        let today = Utc::now().date_naive();

        let total = self.count(&base).await?;
        let completed = self.count(&format!("{}&status=eq.completed", base)).await?;
        let upcoming = self
            .count(&format!(
                "{}&status=eq.scheduled&appointment_date=gte.{}",
                base, today
            ))
            .await?;

        Ok(PatientStats {
            total_appointments: total,
            completed_appointments: completed,
            upcoming_appointments: upcoming,
        })
    }

    async fn count(&self, path: &str) -> Result<i64, PatientError> {
        self.db
            .count(path)
            .await
            .map_err(|e| PatientError::Database(e.to_string()))
    }
}
