//! Demo CRUD endpoints: POST /users, GET /users/{id}
//!
//! Thin handlers over [`crate::users::UserRepo`]; every response uses the
//! shared envelope.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use chime_core::error::ChimeError;

use crate::app::AppState;
use crate::response::{error_response, get_success, post_success};
use crate::users::NewUser;

pub async fn create_user_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(new_user): Json<NewUser>,
) -> impl IntoResponse {
    // Echoed back as the envelope's param field.
    let param = serde_json::to_value(&new_user).unwrap_or(serde_json::Value::Null);
    match state.users.create(new_user) {
        Ok(_user) => Json(post_success(&headers, param, 1)).into_response(),
        Err(e) => {
            let (status, envelope) = error_response(&headers, &e);
            (status, Json(envelope)).into_response()
        }
    }
}

pub async fn find_user_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let id = match id.parse::<Uuid>() {
        Ok(id) => id,
        Err(_) => {
            let err = ChimeError::InvalidArgument(format!("malformed user id {id:?}"));
            let (status, envelope) = error_response(&headers, &err);
            return (status, Json(envelope)).into_response();
        }
    };

    match state.users.find(id) {
        Ok(user) => Json(get_success(&headers, &params, 1, user)).into_response(),
        Err(e) => {
            let (status, envelope) = error_response(&headers, &e);
            (status, Json(envelope)).into_response()
        }
    }
}
