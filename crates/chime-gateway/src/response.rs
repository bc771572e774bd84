//! Uniform JSON response envelope for the gateway.
//!
//! Every endpoint answers with the same outer shape so dashboards and
//! scripts can parse responses uniformly:
//! `{ code, display_msg, raw_msg, request_id, result_data }`.

use axum::http::{HeaderMap, StatusCode};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use chime_core::error::ChimeError;

#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    /// Short machine-readable code: "OK" or an error code.
    pub code: String,
    /// Human-readable summary.
    pub display_msg: String,
    /// Raw error detail; empty on success.
    pub raw_msg: String,
    /// Propagated from `x-request-id` or generated.
    pub request_id: String,
    pub result_data: T,
}

/// Payload shape for read endpoints. `param` echoes the request's query
/// parameters back to the caller.
#[derive(Debug, Serialize)]
pub struct GetResultData<T: Serialize> {
    pub param: Value,
    pub generated_date: String,
    pub total_data: usize,
    pub data: Option<T>,
}

/// Payload shape for write endpoints. `param` echoes the submitted
/// payload; there is no separate `data` field.
#[derive(Debug, Serialize)]
pub struct PostResultData {
    pub param: Value,
    pub executed_date: String,
    pub rows_affected: usize,
}

/// Take the caller's request id from headers, or mint one.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn to_param(param: impl Serialize) -> Value {
    serde_json::to_value(param).unwrap_or(Value::Null)
}

pub fn get_success<T: Serialize>(
    headers: &HeaderMap,
    param: impl Serialize,
    total: usize,
    data: T,
) -> Envelope<GetResultData<T>> {
    Envelope {
        code: "OK".to_string(),
        display_msg: "OK".to_string(),
        raw_msg: String::new(),
        request_id: request_id(headers),
        result_data: GetResultData {
            param: to_param(param),
            generated_date: Utc::now().to_rfc3339(),
            total_data: total,
            data: Some(data),
        },
    }
}

pub fn post_success(
    headers: &HeaderMap,
    param: impl Serialize,
    rows_affected: usize,
) -> Envelope<PostResultData> {
    Envelope {
        code: "OK".to_string(),
        display_msg: "OK".to_string(),
        raw_msg: String::new(),
        request_id: request_id(headers),
        result_data: PostResultData {
            param: to_param(param),
            executed_date: Utc::now().to_rfc3339(),
            rows_affected,
        },
    }
}

/// Error envelope plus the HTTP status the error maps to.
pub fn error_response(
    headers: &HeaderMap,
    err: &ChimeError,
) -> (StatusCode, Envelope<Option<()>>) {
    let status = match err {
        ChimeError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        ChimeError::NotFound(_) => StatusCode::NOT_FOUND,
        ChimeError::Conflict(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let envelope = Envelope {
        code: err.code().to_string(),
        display_msg: status
            .canonical_reason()
            .unwrap_or("Error")
            .to_string(),
        raw_msg: err.to_string(),
        request_id: request_id(headers),
        result_data: None,
    };
    (status, envelope)
}
