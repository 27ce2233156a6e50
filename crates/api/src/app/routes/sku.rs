use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Extension, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};

use skumargin_core::SkuId;
use skumargin_infra::{PageRequest, SkuStore};
use skumargin_inventory::NewSkuRecord;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

/// `GET /sku?id=N` returns one record; otherwise `?page=N` lists records by id.
pub async fn get_sku(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::SkuQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return errors::rejection_to_response(rejection.body_text()),
    };

    if let Some(id) = query.id {
        let sku_id = SkuId::new(id);
        return match services.skus().get(sku_id).await {
            Ok(Some(record)) => (StatusCode::OK, Json(record)).into_response(),
            Ok(None) => errors::json_error(
                StatusCode::NOT_FOUND,
                "sku_not_found",
                format!("sku {sku_id} not found"),
            ),
            Err(e) => errors::store_error_to_response(e),
        };
    }

    let page = PageRequest::new(query.page.unwrap_or(1), services.page_size);
    match services.skus().page(page).await {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn insert_skus(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<Vec<NewSkuRecord>>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::rejection_to_response(rejection.body_text()),
    };
    let submitted = body.len();
    match services.skus().insert_batch(body).await {
        Ok(inserted) => {
            tracing::info!(submitted, inserted, "sku batch ingested");
            (StatusCode::CREATED, Json(dto::InsertedResponse { inserted })).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
