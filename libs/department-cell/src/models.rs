use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub department_id: i64,
    pub department_name: String,
    pub head_doctor_id: Option<i64>,
    pub location: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDepartmentRequest {
    pub department_name: String,
    pub head_doctor_id: Option<i64>,
    pub location: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DepartmentError {
    #[error("Department not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),
}
