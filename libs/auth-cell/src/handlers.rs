use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::{AuthUser, TokenResponse};
use shared_models::error::AppError;
use shared_utils::jwt::validate_token;

use crate::models::{
    AccountError, CreateDoctorUserRequest, CreatePatientUserRequest, LoginRequest, LoginResponse,
};
use crate::services::account::AccountService;

fn map_error(err: AccountError) -> AppError {
    match err {
        AccountError::InvalidCredentials => {
            AppError::Auth("Invalid username or password".to_string())
        }
        AccountError::UsernameTaken => AppError::Conflict("Username is already taken".to_string()),
        AccountError::Hashing(msg) | AccountError::TokenSigning(msg) => AppError::Internal(msg),
        AccountError::Database(msg) => AppError::Database(msg),
    }
}

// Helper function to extract token
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_header = headers
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    if !auth_value.starts_with("Bearer ") {
        return Err(AppError::Auth("Invalid authorization header format".to_string()));
    }

    Ok(auth_value[7..].to_string())
}

/// Token introspection for the front end: is this session still good, and
/// who is it for.
#[axum::debug_handler]
pub async fn verify_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Verifying token");

    let token = extract_bearer_token(&headers)?;

    let user = validate_token(&token, &config.jwt_secret).map_err(AppError::Auth)?;

    Ok(Json(TokenResponse {
        valid: true,
        user_id: user.id,
        username: Some(user.username),
        role: Some(user.role),
    }))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (username, password) = match (request.username, request.password) {
        (Some(username), Some(password)) => (username, password),
        _ => {
            return Err(AppError::BadRequest(
                "Username and password are required".to_string(),
            ))
        }
    };

    let service = AccountService::new(&state);
    let response = service.login(&username, &password).await.map_err(map_error)?;

    Ok(Json(response))
}

/// Admin-only: create a login account linked to a doctor record.
#[axum::debug_handler]
pub async fn create_doctor_user(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateDoctorUserRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let service = AccountService::new(&state);
    let account = service
        .create_user(&request.username, &request.password, "doctor", Some(request.doctor_id), None)
        .await
        .map_err(map_error)?;

    debug!("Doctor user {} created for doctor {}", account.user_id, request.doctor_id);
    Ok(Json(json!({
        "message": "Doctor user created",
        "user_id": account.user_id
    })))
}

/// Admin-only: create a login account linked to a patient record.
#[axum::debug_handler]
pub async fn create_patient_user(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreatePatientUserRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let service = AccountService::new(&state);
    let account = service
        .create_user(&request.username, &request.password, "patient", None, Some(request.patient_id))
        .await
        .map_err(map_error)?;

    debug!("Patient user {} created for patient {}", account.user_id, request.patient_id);
    Ok(Json(json!({
        "message": "Patient user created",
        "user_id": account.user_id
    })))
}

fn require_admin(user: &AuthUser) -> Result<(), AppError> {
    if !user.is_admin() {
        return Err(AppError::Auth("Only admins can manage user accounts".to_string()));
    }
    Ok(())
}
