use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use skumargin_core::SkuId;
use skumargin_infra::{MarginOutcome, MarginRequest};
use skumargin_pricing::{MarginHistoryEntry, MarginMode, MarginRule, parse_target_date};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationMode {
    Manual,
    Auto,
}

/// `POST /margin` body.
///
/// In manual mode `base_margin_percent` is required. In auto mode it is only
/// the seed used when the SKU has no history yet.
#[derive(Debug, Deserialize)]
pub struct CalculateMarginRequest {
    pub sku_id: i64,
    pub mode: CalculationMode,
    #[serde(default)]
    pub base_margin_percent: Option<Decimal>,
    #[serde(default)]
    pub date: Option<String>,
}

impl CalculateMarginRequest {
    pub fn into_request(self) -> Result<MarginRequest, axum::response::Response> {
        let target_date = parse_optional_date(self.date.as_deref())?;

        let mode = match self.mode {
            CalculationMode::Manual => match self.base_margin_percent {
                Some(base) => MarginMode::Manual {
                    base_margin_percent: base,
                },
                None => {
                    return Err(errors::json_error(
                        axum::http::StatusCode::BAD_REQUEST,
                        "validation_error",
                        "base_margin_percent is required in manual mode",
                    ));
                }
            },
            CalculationMode::Auto => MarginMode::Auto {
                seed: self.base_margin_percent,
            },
        };

        Ok(MarginRequest {
            sku_id: SkuId::new(self.sku_id),
            mode,
            target_date,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SkuQuery {
    pub id: Option<i64>,
    pub page: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MarginQuery {
    pub sku_id: Option<i64>,
    pub date: Option<String>,
    #[serde(default)]
    pub latest: bool,
    pub page: Option<i64>,
}

pub fn parse_optional_date(
    raw: Option<&str>,
) -> Result<Option<NaiveDate>, axum::response::Response> {
    raw.map(parse_target_date)
        .transpose()
        .map_err(|e| errors::margin_error_to_response(e.into()))
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct InsertedResponse {
    pub inserted: usize,
}

#[derive(Debug, Serialize)]
pub struct MarginEntryResponse {
    pub id: String,
    pub sku_id: SkuId,
    pub margin_percent: Decimal,
    pub target_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl From<MarginHistoryEntry> for MarginEntryResponse {
    fn from(entry: MarginHistoryEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            sku_id: entry.sku_id,
            margin_percent: entry.margin_percent,
            target_date: entry.target_date,
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MarginCalculatedResponse {
    #[serde(flatten)]
    pub entry: MarginEntryResponse,
    pub base_margin_percent: Decimal,
    pub rule: MarginRule,
}

impl From<MarginOutcome> for MarginCalculatedResponse {
    fn from(outcome: MarginOutcome) -> Self {
        Self {
            entry: outcome.entry.into(),
            base_margin_percent: outcome.base_margin_percent,
            rule: outcome.rule,
        }
    }
}

pub fn margin_entries(entries: Vec<MarginHistoryEntry>) -> Vec<MarginEntryResponse> {
    entries.into_iter().map(Into::into).collect()
}
