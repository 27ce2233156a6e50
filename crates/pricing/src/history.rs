//! Margin history entries and the rules that order them.
//!
//! Entries of one SKU are ordered by the two-key ledger order
//! `(target_date, sequence)`: the calendar date the margin applies to, then the
//! creation sequence assigned by the ledger on append. The "latest" entry is the
//! maximum under that order. Insertion order is never relied upon, since
//! concurrent writers may append out of `target_date` order.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use skumargin_core::{DomainError, DomainResult, Entity, MarginEntryId, SkuId};

/// One dated decision outcome for a SKU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginHistoryEntry {
    pub id: MarginEntryId,
    pub sku_id: SkuId,
    pub margin_percent: Decimal,
    pub target_date: NaiveDate,
    /// Creation order within the ledger (strictly increasing per append).
    pub sequence: u64,
    pub created_at: DateTime<Utc>,
}

impl Entity for MarginHistoryEntry {
    type Id = MarginEntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl MarginHistoryEntry {
    /// Sort key within a single SKU's history.
    pub fn ledger_key(&self) -> (NaiveDate, u64) {
        (self.target_date, self.sequence)
    }

    /// Sort key for date pages: SKU first, then ledger order.
    pub fn page_key(&self) -> (SkuId, NaiveDate, u64) {
        (self.sku_id, self.target_date, self.sequence)
    }

    /// The latest entry: greatest `target_date`, ties broken by greatest `sequence`.
    pub fn latest<'a, I>(entries: I) -> Option<&'a MarginHistoryEntry>
    where
        I: IntoIterator<Item = &'a MarginHistoryEntry>,
    {
        entries.into_iter().max_by_key(|e| e.ledger_key())
    }

    /// The entry for an exact `target_date`; several on one date resolve to the newest.
    pub fn on_date<'a, I>(entries: I, date: NaiveDate) -> Option<&'a MarginHistoryEntry>
    where
        I: IntoIterator<Item = &'a MarginHistoryEntry>,
    {
        Self::latest(entries.into_iter().filter(|e| e.target_date == date))
    }

    pub fn sort_ledger_order(entries: &mut [MarginHistoryEntry]) {
        entries.sort_by_key(|e| e.ledger_key());
    }

    pub fn sort_page_order(entries: &mut [MarginHistoryEntry]) {
        entries.sort_by_key(|e| e.page_key());
    }
}

/// Request to append a margin to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMarginEntry {
    pub sku_id: SkuId,
    pub margin_percent: Decimal,
    /// `None` means "the processing date".
    pub target_date: Option<NaiveDate>,
}

impl NewMarginEntry {
    pub fn resolve_date(&self, today: NaiveDate) -> NaiveDate {
        self.target_date.unwrap_or(today)
    }
}

/// How the base margin for a calculation is obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarginMode {
    /// Base supplied by the caller; history is not consulted.
    Manual { base_margin_percent: Decimal },
    /// Base is the latest ledger entry, or `seed` when the SKU has no history yet.
    Auto { seed: Option<Decimal> },
}

impl MarginMode {
    pub fn consults_history(&self) -> bool {
        matches!(self, MarginMode::Auto { .. })
    }

    /// Resolve the base margin. `None` means auto mode has neither history nor seed.
    pub fn resolve_base(&self, latest: Option<&MarginHistoryEntry>) -> Option<Decimal> {
        match self {
            MarginMode::Manual { base_margin_percent } => Some(*base_margin_percent),
            MarginMode::Auto { seed } => latest.map(|e| e.margin_percent).or(*seed),
        }
    }
}

/// Parse a zero-padded `YYYY-MM-DD` calendar date.
pub fn parse_target_date(raw: &str) -> DomainResult<NaiveDate> {
    let trimmed = raw.trim();
    let well_formed = trimmed.len() == 10
        && trimmed.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(DomainError::invalid_date(format!(
            "'{raw}': expected YYYY-MM-DD"
        )));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|e| DomainError::invalid_date(format!("'{raw}': {e}; expected YYYY-MM-DD")))
}
