use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

/// Claims carried by the signed session token. `sub` is the login account id;
/// the linked ids point at the doctor/patient row the account acts for.
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub username: Option<String>,
    pub role: Option<String>,
    pub linked_doctor_id: Option<i64>,
    pub linked_patient_id: Option<i64>,
    pub iat: Option<i64>,
    pub exp: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub role: String,
    pub linked_doctor_id: Option<i64>,
    pub linked_patient_id: Option<i64>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }

    pub fn is_doctor(&self) -> bool {
        self.role == "doctor"
    }

    pub fn is_patient(&self) -> bool {
        self.role == "patient"
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub valid: bool,
    pub user_id: i64,
    pub username: Option<String>,
    pub role: Option<String>,
}
