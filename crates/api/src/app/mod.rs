//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and the margin service
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses
//! - `admission.rs`: concurrency limit with a bounded wait

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

pub mod admission;
pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use admission::AdmissionLimit;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: services::AppServices, limit: AdmissionLimit) -> Router {
    let app = Router::new()
        .route("/ping", get(routes::system::ping))
        .merge(routes::router())
        .layer(ServiceBuilder::new().layer(Extension(Arc::new(services))));

    with_admission(app, limit)
}

/// Guard every route of `router` with one shared admission limit.
pub fn with_admission(router: Router, limit: AdmissionLimit) -> Router {
    router.layer(axum::middleware::from_fn_with_state(
        limit,
        admission::admission_middleware,
    ))
}
