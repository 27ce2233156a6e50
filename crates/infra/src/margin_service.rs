//! Margin calculation pipeline.
//!
//! ```text
//! MarginRequest
//!   ↓
//! 1. Fetch the SKU snapshot (SkuNotFound when absent)
//!   ↓
//! 2. Resolve the base margin (manual: caller value; auto: latest entry or seed)
//!   ↓
//! 3. Run the decision engine (pure)
//!   ↓
//! 4. Append the result to the ledger
//! ```
//!
//! Nothing is written unless every earlier step succeeded, and the append
//! itself is all-or-nothing.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::instrument;

use skumargin_core::{DomainError, SkuId};
use skumargin_pricing::{
    MarginHistoryEntry, MarginMode, MarginPolicy, MarginRule, NewMarginEntry, decide,
};

use crate::error::StoreError;
use crate::ledger::MarginLedger;
use crate::sku_store::SkuStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MarginError {
    #[error("sku {0} not found")]
    SkuNotFound(SkuId),

    #[error("sku {0} has no margin history and no seed margin was supplied")]
    NoHistoryNoSeed(SkuId),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DomainError> for MarginError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::InvalidDate(msg) => MarginError::InvalidDate(msg),
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                MarginError::Validation(msg)
            }
        }
    }
}

/// One calculation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarginRequest {
    pub sku_id: SkuId,
    pub mode: MarginMode,
    /// `None` stores the result under the processing date.
    pub target_date: Option<NaiveDate>,
}

/// Result of a calculation: the stored entry plus how it was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarginOutcome {
    pub entry: MarginHistoryEntry,
    pub base_margin_percent: Decimal,
    pub rule: MarginRule,
}

/// Composes a SKU store, the margin ledger and the policy constants.
#[derive(Debug)]
pub struct MarginService<S, L> {
    skus: S,
    ledger: L,
    policy: MarginPolicy,
}

impl<S, L> MarginService<S, L>
where
    S: SkuStore,
    L: MarginLedger,
{
    pub fn new(skus: S, ledger: L, policy: MarginPolicy) -> Self {
        Self {
            skus,
            ledger,
            policy,
        }
    }

    pub fn skus(&self) -> &S {
        &self.skus
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn policy(&self) -> &MarginPolicy {
        &self.policy
    }

    /// Compute the next margin for a SKU and record it.
    #[instrument(skip(self, request), fields(sku_id = %request.sku_id), err)]
    pub async fn calculate(&self, request: MarginRequest) -> Result<MarginOutcome, MarginError> {
        let snapshot = self
            .skus
            .fetch_snapshot(request.sku_id)
            .await?
            .ok_or(MarginError::SkuNotFound(request.sku_id))?;

        let latest = if request.mode.consults_history() {
            self.ledger.latest(request.sku_id).await?
        } else {
            None
        };

        let base = request
            .mode
            .resolve_base(latest.as_ref())
            .ok_or(MarginError::NoHistoryNoSeed(request.sku_id))?;

        let decision = decide(&snapshot.signals(), base, &self.policy);

        let entry = self
            .ledger
            .append(NewMarginEntry {
                sku_id: request.sku_id,
                margin_percent: decision.margin,
                target_date: request.target_date,
            })
            .await?;

        tracing::info!(
            base = %base,
            margin = %entry.margin_percent,
            rule = decision.rule.as_str(),
            "margin calculated"
        );

        Ok(MarginOutcome {
            entry,
            base_margin_percent: base,
            rule: decision.rule,
        })
    }
}
