use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

/// Login is the only unauthenticated route in the application.
pub fn auth_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/login", post(handlers::login))
        .route("/verify", get(handlers::verify_token))
        .with_state(state)
}

/// Account management for doctors and patients, admin-gated in the handlers.
pub fn user_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/create-doctor-user", post(handlers::create_doctor_user))
        .route("/create-patient-user", post(handlers::create_patient_user))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
