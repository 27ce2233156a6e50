use axum::{Router, routing::get};

pub mod margin;
pub mod sku;
pub mod system;

/// Router for the SKU and margin endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/sku", get(sku::get_sku).post(sku::insert_skus))
        .route("/margin", get(margin::get_margins).post(margin::calculate_margin))
}
