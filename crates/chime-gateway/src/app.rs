use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use chime_core::config::ChimeConfig;
use chime_scheduler::Controller;

use crate::users::UserRepo;

/// Central shared state, passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: ChimeConfig,
    pub controller: Arc<Controller>,
    pub users: UserRepo,
}

impl AppState {
    pub fn new(config: ChimeConfig, controller: Arc<Controller>) -> Self {
        Self {
            config,
            controller,
            users: UserRepo::new(),
        }
    }
}

/// Assemble the full Axum router. All scheduler routes are read-only.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/jobs", get(crate::http::jobs::jobs_handler))
        .route("/users", post(crate::http::users::create_user_handler))
        .route("/users/{id}", get(crate::http::users::find_user_handler))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
