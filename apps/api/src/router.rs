use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::appointment_routes;
use auth_cell::router::{auth_routes, user_routes};
use dashboard_cell::router::dashboard_routes;
use department_cell::router::department_routes;
use doctor_cell::router::doctor_routes;
use medical_record_cell::router::medical_record_routes;
use notification_cell::router::notification_routes;
use patient_cell::router::patient_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Medward API is running!" }))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/users", user_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/doctors", doctor_routes(state.clone()))
        .nest("/patients", patient_routes(state.clone()))
        .nest("/departments", department_routes(state.clone()))
        .nest("/medical-records", medical_record_routes(state.clone()))
        .nest("/notifications", notification_routes(state.clone()))
        .nest("/dashboard", dashboard_routes(state))
}
