use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::postgrest::{PostgrestClient, StorageError};
use shared_models::auth::AuthUser;
use shared_utils::jwt::issue_token;

use crate::models::{AccountError, LoginResponse, LoginUser, UserAccount};
use crate::services::password::{hash_password, verify_password};

pub struct AccountService {
    db: PostgrestClient,
    jwt_secret: String,
}

impl AccountService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
            jwt_secret: config.jwt_secret.clone(),
        }
    }

    /// Username/password exchange for a signed session token.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, AccountError> {
        debug!("Login attempt for username: {}", username);

        let account = match self.find_by_username(username).await? {
            Some(account) => account,
            // Same error as a bad password so usernames cannot be probed.
            None => return Err(AccountError::InvalidCredentials),
        };

        let valid = verify_password(password, &account.password)
            .map_err(|e| AccountError::Hashing(e.to_string()))?;
        if !valid {
            return Err(AccountError::InvalidCredentials);
        }

        let auth_user = AuthUser {
            id: account.user_id,
            username: account.username.clone(),
            role: account.role.clone(),
            linked_doctor_id: account.linked_doctor_id,
            linked_patient_id: account.linked_patient_id,
        };

        let token = issue_token(&auth_user, &self.jwt_secret).map_err(AccountError::TokenSigning)?;

        info!("User {} logged in with role {}", account.user_id, account.role);

        Ok(LoginResponse {
            token,
            user: LoginUser {
                user_id: account.user_id,
                username: account.username,
                role: account.role,
                linked_doctor_id: account.linked_doctor_id,
                linked_patient_id: account.linked_patient_id,
            },
        })
    }

    /// Creates a login account for a staff or patient record.
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        role: &str,
        linked_doctor_id: Option<i64>,
        linked_patient_id: Option<i64>,
    ) -> Result<UserAccount, AccountError> {
        debug!("Creating {} account for username: {}", role, username);

        if self.find_by_username(username).await?.is_some() {
            return Err(AccountError::UsernameTaken);
        }

        let password_hash =
            hash_password(password).map_err(|e| AccountError::Hashing(e.to_string()))?;

        let row = json!({
            "username": username,
            "password": password_hash,
            "role": role,
            "linked_doctor_id": linked_doctor_id,
            "linked_patient_id": linked_patient_id,
            "created_at": Utc::now().to_rfc3339()
        });

        let result = self.db.insert_returning("users", row).await.map_err(|e| match e {
            StorageError::Conflict(_) => AccountError::UsernameTaken,
            other => AccountError::Database(other.to_string()),
        })?;

        let created = result
            .first()
            .ok_or_else(|| AccountError::Database("Failed to create user".to_string()))?;

        serde_json::from_value(created.clone())
            .map_err(|e| AccountError::Database(format!("Failed to parse user: {}", e)))
    }

    /// Seeds the administrative account from configuration. Called once at
    /// startup; a second run finds the row and does nothing.
    pub async fn ensure_admin_account(&self, config: &AppConfig) -> Result<(), AccountError> {
        if !config.is_admin_bootstrap_configured() {
            warn!("Admin bootstrap skipped - ADMIN_USERNAME/ADMIN_PASSWORD not configured");
            return Ok(());
        }

        if self.find_by_username(&config.admin_username).await?.is_some() {
            debug!("Admin account already present");
            return Ok(());
        }

        info!("Seeding admin account: {}", config.admin_username);
        match self
            .create_user(&config.admin_username, &config.admin_password, "admin", None, None)
            .await
        {
            Ok(_) => Ok(()),
            // Lost a startup race against another instance; the row exists.
            Err(AccountError::UsernameTaken) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>, AccountError> {
        let path = format!(
            "/rest/v1/users?username=eq.{}",
            urlencoding::encode(username)
        );
        let result: Vec<Value> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AccountError::Database(e.to_string()))?;

        match result.first() {
            Some(row) => serde_json::from_value(row.clone())
                .map(Some)
                .map_err(|e| AccountError::Database(format!("Failed to parse user: {}", e))),
            None => Ok(None),
        }
    }
}
