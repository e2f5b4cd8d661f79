use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub record_id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub visit_date: Option<NaiveDate>,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub prescription: Option<String>,
    pub lab_results: Option<String>,
    pub notes: Option<String>,
}

/// Listing row: the record plus the names of the people involved.
#[derive(Debug, Clone, Serialize)]
pub struct MedicalRecordListing {
    #[serde(flatten)]
    pub record: MedicalRecord,
    pub patient_first_name: Option<String>,
    pub patient_last_name: Option<String>,
    pub doctor_first_name: Option<String>,
    pub doctor_last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMedicalRecordRequest {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub visit_date: Option<NaiveDate>,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub prescription: Option<String>,
    pub lab_results: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum MedicalRecordError {
    #[error("Medical record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),
}
