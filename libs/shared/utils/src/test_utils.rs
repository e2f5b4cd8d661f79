use std::sync::Arc;

use shared_config::AppConfig;
use shared_models::auth::AuthUser;

use crate::jwt::issue_token;

pub struct TestConfig {
    pub jwt_secret: String,
    pub database_rest_url: String,
    pub database_service_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            database_rest_url: "http://localhost:54321".to_string(),
            database_service_key: "test-service-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            database_rest_url: self.database_rest_url.clone(),
            database_service_key: self.database_service_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            listen_port: 3000,
            admin_username: "admin".to_string(),
            admin_password: "test-admin-password".to_string(),
            admin_user_id: 1,
        }
    }

    /// Config pointing at a mock storage server (wiremock).
    pub fn with_storage_url(url: &str) -> AppConfig {
        let mut config = Self::default().to_app_config();
        config.database_rest_url = url.to_string();
        config
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestAccount;

impl TestAccount {
    pub fn admin() -> AuthUser {
        AuthUser {
            id: 1,
            username: "admin".to_string(),
            role: "admin".to_string(),
            linked_doctor_id: None,
            linked_patient_id: None,
        }
    }

    pub fn doctor(doctor_id: i64) -> AuthUser {
        AuthUser {
            id: 100 + doctor_id,
            username: format!("doctor{}", doctor_id),
            role: "doctor".to_string(),
            linked_doctor_id: Some(doctor_id),
            linked_patient_id: None,
        }
    }

    pub fn patient(patient_id: i64) -> AuthUser {
        AuthUser {
            id: 200 + patient_id,
            username: format!("patient{}", patient_id),
            role: "patient".to_string(),
            linked_doctor_id: None,
            linked_patient_id: Some(patient_id),
        }
    }

    pub fn bearer_token(user: &AuthUser, secret: &str) -> String {
        issue_token(user, secret).expect("token signing in tests")
    }
}
