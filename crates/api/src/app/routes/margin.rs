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
use skumargin_infra::{MarginLedger, PageRequest};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn calculate_margin(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CalculateMarginRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::rejection_to_response(rejection.body_text()),
    };
    let request = match body.into_request() {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    match services.margin.calculate(request).await {
        Ok(outcome) => (
            StatusCode::CREATED,
            Json(dto::MarginCalculatedResponse::from(outcome)),
        )
            .into_response(),
        Err(e) => errors::margin_error_to_response(e),
    }
}

/// Margin history queries:
///
/// - `?sku_id=N&latest=true`: latest entry
/// - `?sku_id=N&date=D`: entry for that date
/// - `?sku_id=N`: every entry of the SKU (404 when there are none)
/// - `?date=D&page=P`: one page of entries for that date
/// - `?page=P`: one page of all entries
pub async fn get_margins(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::MarginQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return errors::rejection_to_response(rejection.body_text()),
    };
    let date = match dto::parse_optional_date(query.date.as_deref()) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let page = PageRequest::new(query.page.unwrap_or(1), services.page_size);
    let ledger = services.ledger();

    let Some(sku_id) = query.sku_id.map(SkuId::new) else {
        let listed = match date {
            Some(date) => ledger.page(date, page).await,
            None => ledger.page_all(page).await,
        };
        return match listed {
            Ok(entries) => (StatusCode::OK, Json(dto::margin_entries(entries))).into_response(),
            Err(e) => errors::store_error_to_response(e),
        };
    };

    if query.latest || date.is_some() {
        let found = match date {
            Some(date) if !query.latest => ledger.by_date(sku_id, date).await,
            _ => ledger.latest(sku_id).await,
        };
        return match found {
            Ok(Some(entry)) => {
                (StatusCode::OK, Json(dto::MarginEntryResponse::from(entry))).into_response()
            }
            Ok(None) => errors::not_found(format!("no margin history for sku {sku_id}")),
            Err(e) => errors::store_error_to_response(e),
        };
    }

    match ledger.all_for_sku(sku_id).await {
        Ok(entries) if entries.is_empty() => {
            errors::not_found(format!("no margin history for sku {sku_id}"))
        }
        Ok(entries) => (StatusCode::OK, Json(dto::margin_entries(entries))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
