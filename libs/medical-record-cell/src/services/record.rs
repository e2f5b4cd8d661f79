use std::collections::HashMap;

use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::postgrest::PostgrestClient;

use crate::models::{
    CreateMedicalRecordRequest, MedicalRecord, MedicalRecordError, MedicalRecordListing,
};

pub struct MedicalRecordService {
    db: PostgrestClient,
}

impl MedicalRecordService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    pub async fn create_record(
        &self,
        request: CreateMedicalRecordRequest,
    ) -> Result<MedicalRecord, MedicalRecordError> {
        debug!(
            "Creating medical record for patient {} by doctor {}",
            request.patient_id, request.doctor_id
        );

        let row = json!({
            "patient_id": request.patient_id,
            "doctor_id": request.doctor_id,
            "visit_date": request.visit_date,
            "diagnosis": request.diagnosis,
            "treatment": request.treatment,
            "prescription": request.prescription,
            "lab_results": request.lab_results,
            "notes": request.notes,
            "created_at": Utc::now().to_rfc3339()
        });

        let result = self
            .db
            .insert_returning("medical_records", row)
            .await
            .map_err(|e| MedicalRecordError::Database(e.to_string()))?;

        let created = result
            .first()
            .ok_or_else(|| MedicalRecordError::Database("Failed to create medical record".to_string()))?;

        serde_json::from_value(created.clone())
            .map_err(|e| MedicalRecordError::Database(format!("Failed to parse medical record: {}", e)))
    }

    /// All records, newest visit first, with patient and doctor names folded
    /// in from their own tables.
    pub async fn list_records(&self) -> Result<Vec<MedicalRecordListing>, MedicalRecordError> {
        debug!("Fetching all medical records");

        let result: Vec<Value> = self
            .db
            .request(
                Method::GET,
                "/rest/v1/medical_records?order=visit_date.desc",
                None,
            )
            .await
            .map_err(|e| MedicalRecordError::Database(e.to_string()))?;

        let records: Vec<MedicalRecord> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<MedicalRecord>, _>>()
            .map_err(|e| MedicalRecordError::Database(format!("Failed to parse medical records: {}", e)))?;

        let patients = self.name_index("patients", "patient_id").await?;
        let doctors = self.name_index("doctors", "doctor_id").await?;

        Ok(records
            .into_iter()
            .map(|record| {
                let patient = patients.get(&record.patient_id);
                let doctor = doctors.get(&record.doctor_id);
                MedicalRecordListing {
                    patient_first_name: patient.map(|(first, _)| first.clone()),
                    patient_last_name: patient.map(|(_, last)| last.clone()),
                    doctor_first_name: doctor.map(|(first, _)| first.clone()),
                    doctor_last_name: doctor.map(|(_, last)| last.clone()),
                    record,
                }
            })
            .collect())
    }

    pub async fn delete_record(&self, record_id: i64) -> Result<(), MedicalRecordError> {
        debug!("Deleting medical record: {}", record_id);

        let path = format!("/rest/v1/medical_records?record_id=eq.{}", record_id);
        let deleted = self
            .db
            .delete_returning(&path)
            .await
            .map_err(|e| MedicalRecordError::Database(e.to_string()))?;

        if deleted.is_empty() {
            return Err(MedicalRecordError::NotFound);
        }

        Ok(())
    }

    async fn name_index(
        &self,
        table: &str,
        id_column: &str,
    ) -> Result<HashMap<i64, (String, String)>, MedicalRecordError> {
        let path = format!("/rest/v1/{}?select={},first_name,last_name", table, id_column);
        let rows: Vec<Value> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| MedicalRecordError::Database(e.to_string()))?;

        let mut index = HashMap::new();
        for row in &rows {
            if let (Some(id), Some(first), Some(last)) = (
                row[id_column].as_i64(),
                row["first_name"].as_str(),
                row["last_name"].as_str(),
            ) {
                index.insert(id, (first.to_string(), last.to_string()));
            }
        }

        Ok(index)
    }
}
