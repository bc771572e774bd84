//! Status page: GET /jobs
//!
//! Read-only snapshot of every registration: live entries with their next
//! due times, followed by Down jobs (specs that failed to parse) with
//! their parse errors. No write operations are exposed.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use chime_scheduler::EntrySnapshot;

use crate::app::AppState;
use crate::response::{get_success, Envelope, GetResultData};

#[derive(Serialize)]
pub struct JobsData {
    pub jobs: Vec<EntrySnapshot>,
    pub pool_capacity: usize,
    pub pool_available: usize,
}

pub async fn jobs_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<Envelope<GetResultData<JobsData>>> {
    let mut jobs = state.controller.entries();
    jobs.extend(state.controller.down_jobs());
    let total = jobs.len();

    Json(get_success(
        &headers,
        &params,
        total,
        JobsData {
            jobs,
            pool_capacity: state.controller.pool_capacity(),
            pool_available: state.controller.pool_available(),
        },
    ))
}
