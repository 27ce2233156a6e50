use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use skumargin_infra::{MarginError, StoreError};

pub fn margin_error_to_response(err: MarginError) -> axum::response::Response {
    match err {
        MarginError::SkuNotFound(_) => {
            json_error(StatusCode::NOT_FOUND, "sku_not_found", err.to_string())
        }
        MarginError::NoHistoryNoSeed(_) => {
            json_error(StatusCode::BAD_REQUEST, "no_history_no_seed", err.to_string())
        }
        MarginError::InvalidDate(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_date", msg),
        MarginError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        MarginError::Store(e) => store_error_to_response(e),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::Database(_) | StoreError::LockPoisoned => {
            tracing::error!(error = %err, "storage failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                err.to_string(),
            )
        }
    }
}

/// Malformed query strings and bodies become a JSON 400.
pub fn rejection_to_response(message: String) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "validation_error", message)
}

pub fn not_found(message: impl Into<String>) -> axum::response::Response {
    json_error(StatusCode::NOT_FOUND, "not_found", message)
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
