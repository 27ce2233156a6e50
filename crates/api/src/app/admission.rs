//! Admission control: at most N requests in flight; a request that cannot get
//! a slot within the wait limit is answered with `429 Too Many Requests`.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tokio::sync::Semaphore;

use crate::app::errors;

#[derive(Debug, Clone)]
pub struct AdmissionLimit {
    slots: Arc<Semaphore>,
    max_wait: Duration,
}

impl AdmissionLimit {
    /// `max_concurrent` below 1 is treated as 1.
    pub fn new(max_concurrent: usize, max_wait: Duration) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(max_concurrent.max(1))),
            max_wait,
        }
    }
}

pub async fn admission_middleware(
    State(limit): State<AdmissionLimit>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let permit = match tokio::time::timeout(limit.max_wait, limit.slots.clone().acquire_owned()).await
    {
        Ok(Ok(permit)) => permit,
        Ok(Err(_closed)) => {
            return errors::json_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "unavailable",
                "server is shutting down",
            );
        }
        Err(_elapsed) => {
            tracing::warn!(
                wait_ms = limit.max_wait.as_millis() as u64,
                path = %req.uri().path(),
                "no request slot available"
            );
            return errors::json_error(
                StatusCode::TOO_MANY_REQUESTS,
                "too_many_requests",
                "too many concurrent requests, try again later",
            );
        }
    };

    let response = next.run(req).await;
    drop(permit);
    response
}
