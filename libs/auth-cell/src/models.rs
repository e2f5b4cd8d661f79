use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A login account as stored. `password` holds the argon2 hash, never the
/// clear text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub user_id: i64,
    pub username: String,
    pub password: String,
    pub role: String,
    pub linked_doctor_id: Option<i64>,
    pub linked_patient_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: LoginUser,
}

#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub user_id: i64,
    pub username: String,
    pub role: String,
    pub linked_doctor_id: Option<i64>,
    pub linked_patient_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDoctorUserRequest {
    pub username: String,
    pub password: String,
    pub doctor_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePatientUserRequest {
    pub username: String,
    pub password: String,
    pub patient_id: i64,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AccountError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Username is already taken")]
    UsernameTaken,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Token signing failed: {0}")]
    TokenSigning(String),

    #[error("Database error: {0}")]
    Database(String),
}
