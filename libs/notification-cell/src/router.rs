use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn notification_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/{user_id}", get(handlers::get_notifications_by_user))
        .route("/", post(handlers::create_notification))
        .route("/{id}/read", put(handlers::mark_notification_read))
        .route("/mark-all-read/{user_id}", put(handlers::mark_all_notifications_read))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
