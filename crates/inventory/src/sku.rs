use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use skumargin_core::{DomainError, DomainResult, Entity, SkuId, ValueObject};
use skumargin_pricing::MarginSignals;

/// Maximum length of a SKU code.
pub const SKU_CODE_MAX_LEN: usize = 50;

/// Stored SKU record: order plan, stock and reporting metrics.
///
/// Only `planned_orders_per_sku`, `actual_orders` and `stock` feed the margin
/// engine; the remaining metrics are carried for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuRecord {
    pub id: SkuId,
    pub sku: String,
    pub planned_orders: Option<i64>,
    pub planned_orders_per_sku: i64,
    pub actual_orders: i64,
    pub stock: i64,
    pub planned_margin: Option<Decimal>,
    pub margin_yesterday: Option<Decimal>,
    pub margin_week: Option<Decimal>,
    /// Advertising spend share.
    pub drr: Option<Decimal>,
    pub min_bid_tft: Option<Decimal>,
    pub bid_yesterday: Option<Decimal>,
    pub current_price: Option<Decimal>,
    pub retail_price_rp: Option<Decimal>,
}

impl Entity for SkuRecord {
    type Id = SkuId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl SkuRecord {
    /// Point-in-time view used for one calculation.
    pub fn snapshot(&self) -> SkuSnapshot {
        SkuSnapshot {
            sku_id: self.id,
            planned_orders_per_sku: self.planned_orders_per_sku,
            actual_orders: self.actual_orders,
            stock: self.stock,
        }
    }
}

/// Ingestion payload: a SKU record before the store assigns its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSkuRecord {
    pub sku: String,
    #[serde(default)]
    pub planned_orders: Option<i64>,
    #[serde(default)]
    pub planned_orders_per_sku: i64,
    #[serde(default)]
    pub actual_orders: i64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub planned_margin: Option<Decimal>,
    #[serde(default)]
    pub margin_yesterday: Option<Decimal>,
    #[serde(default)]
    pub margin_week: Option<Decimal>,
    #[serde(default)]
    pub drr: Option<Decimal>,
    #[serde(default)]
    pub min_bid_tft: Option<Decimal>,
    #[serde(default)]
    pub bid_yesterday: Option<Decimal>,
    #[serde(default)]
    pub current_price: Option<Decimal>,
    #[serde(default)]
    pub retail_price_rp: Option<Decimal>,
}

impl NewSkuRecord {
    /// A record with just the fields the engine reads.
    pub fn with_signals(sku: impl Into<String>, planned: i64, actual: i64, stock: i64) -> Self {
        Self {
            sku: sku.into(),
            planned_orders: None,
            planned_orders_per_sku: planned,
            actual_orders: actual,
            stock,
            planned_margin: None,
            margin_yesterday: None,
            margin_week: None,
            drr: None,
            min_bid_tft: None,
            bid_yesterday: None,
            current_price: None,
            retail_price_rp: None,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        let code = self.sku.trim();
        if code.is_empty() {
            return Err(DomainError::validation("sku cannot be empty"));
        }
        if code.chars().count() > SKU_CODE_MAX_LEN {
            return Err(DomainError::validation(format!(
                "sku cannot exceed {SKU_CODE_MAX_LEN} characters"
            )));
        }
        if self.stock < 0 {
            return Err(DomainError::validation("stock cannot be negative"));
        }
        Ok(())
    }

    /// The normalized code used for de-duplication.
    pub fn code(&self) -> &str {
        self.sku.trim()
    }

    pub fn into_record(self, id: SkuId) -> SkuRecord {
        SkuRecord {
            id,
            sku: self.sku.trim().to_string(),
            planned_orders: self.planned_orders,
            planned_orders_per_sku: self.planned_orders_per_sku,
            actual_orders: self.actual_orders,
            stock: self.stock,
            planned_margin: self.planned_margin,
            margin_yesterday: self.margin_yesterday,
            margin_week: self.margin_week,
            drr: self.drr,
            min_bid_tft: self.min_bid_tft,
            bid_yesterday: self.bid_yesterday,
            current_price: self.current_price,
            retail_price_rp: self.retail_price_rp,
        }
    }
}

/// The SKU signals read for a single margin calculation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuSnapshot {
    pub sku_id: SkuId,
    pub planned_orders_per_sku: i64,
    pub actual_orders: i64,
    pub stock: i64,
}

impl ValueObject for SkuSnapshot {}

impl SkuSnapshot {
    pub fn signals(&self) -> MarginSignals {
        MarginSignals {
            planned_orders_per_sku: self.planned_orders_per_sku,
            actual_orders: self.actual_orders,
            stock: self.stock,
        }
    }
}
