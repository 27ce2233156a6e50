use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{NaiveDate, Utc};

use skumargin_core::{MarginEntryId, SkuId};
use skumargin_pricing::{MarginHistoryEntry, NewMarginEntry};

use super::r#trait::MarginLedger;
use crate::error::StoreError;
use crate::pagination::PageRequest;

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<SkuId, Vec<MarginHistoryEntry>>,
    last_sequence: u64,
}

/// In-memory append-only margin ledger.
///
/// Intended for tests/dev. Appends take the write lock, which serializes them
/// and makes the assigned `sequence` agree with visibility order.
#[derive(Debug, Default)]
pub struct InMemoryMarginLedger {
    inner: RwLock<Inner>,
}

impl InMemoryMarginLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&Inner) -> T) -> Result<T, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(f(&inner))
    }
}

#[async_trait::async_trait]
impl MarginLedger for InMemoryMarginLedger {
    async fn append(&self, entry: NewMarginEntry) -> Result<MarginHistoryEntry, StoreError> {
        let now = Utc::now();
        let mut inner = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;

        inner.last_sequence += 1;
        let stored = MarginHistoryEntry {
            id: MarginEntryId::new(),
            sku_id: entry.sku_id,
            margin_percent: entry.margin_percent,
            target_date: entry.resolve_date(now.date_naive()),
            sequence: inner.last_sequence,
            created_at: now,
        };
        inner
            .entries
            .entry(entry.sku_id)
            .or_default()
            .push(stored.clone());

        tracing::info!(
            entry_id = %stored.id,
            sku_id = %stored.sku_id,
            target_date = %stored.target_date,
            "margin history entry created"
        );
        Ok(stored)
    }

    async fn latest(&self, sku_id: SkuId) -> Result<Option<MarginHistoryEntry>, StoreError> {
        let latest = self.read(|inner| {
            inner
                .entries
                .get(&sku_id)
                .and_then(|entries| MarginHistoryEntry::latest(entries).cloned())
        })?;

        if latest.is_none() {
            tracing::warn!(sku_id = %sku_id, "no margin history found");
        }
        Ok(latest)
    }

    async fn by_date(
        &self,
        sku_id: SkuId,
        date: NaiveDate,
    ) -> Result<Option<MarginHistoryEntry>, StoreError> {
        self.read(|inner| {
            inner
                .entries
                .get(&sku_id)
                .and_then(|entries| MarginHistoryEntry::on_date(entries, date).cloned())
        })
    }

    async fn all_for_sku(&self, sku_id: SkuId) -> Result<Vec<MarginHistoryEntry>, StoreError> {
        let mut entries = self.read(|inner| inner.entries.get(&sku_id).cloned().unwrap_or_default())?;
        MarginHistoryEntry::sort_ledger_order(&mut entries);
        Ok(entries)
    }

    async fn page(
        &self,
        date: NaiveDate,
        page: PageRequest,
    ) -> Result<Vec<MarginHistoryEntry>, StoreError> {
        let mut entries: Vec<MarginHistoryEntry> = self.read(|inner| {
            inner
                .entries
                .values()
                .flatten()
                .filter(|e| e.target_date == date)
                .cloned()
                .collect()
        })?;
        MarginHistoryEntry::sort_page_order(&mut entries);
        Ok(page.apply(entries))
    }

    async fn page_all(&self, page: PageRequest) -> Result<Vec<MarginHistoryEntry>, StoreError> {
        let mut entries: Vec<MarginHistoryEntry> =
            self.read(|inner| inner.entries.values().flatten().cloned().collect())?;
        MarginHistoryEntry::sort_page_order(&mut entries);
        Ok(page.apply(entries))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use skumargin_pricing::parse_target_date;

    use super::*;

    fn date(s: &str) -> NaiveDate {
        parse_target_date(s).unwrap()
    }

    fn new_entry(sku: i64, margin: Decimal, target: Option<&str>) -> NewMarginEntry {
        NewMarginEntry {
            sku_id: SkuId::new(sku),
            margin_percent: margin,
            target_date: target.map(date),
        }
    }

    #[tokio::test]
    async fn latest_follows_target_date_not_append_order() {
        let ledger = InMemoryMarginLedger::new();
        ledger.append(new_entry(1, dec!(0.01), Some("2024-01-01"))).await.unwrap();
        ledger.append(new_entry(1, dec!(0.03), Some("2024-01-03"))).await.unwrap();
        ledger.append(new_entry(1, dec!(0.02), Some("2024-01-02"))).await.unwrap();

        let latest = ledger.latest(SkuId::new(1)).await.unwrap().unwrap();
        assert_eq!(latest.target_date, date("2024-01-03"));
        assert_eq!(latest.margin_percent, dec!(0.03));
    }

    #[tokio::test]
    async fn latest_is_none_without_history() {
        let ledger = InMemoryMarginLedger::new();
        ledger.append(new_entry(2, dec!(0.1), None)).await.unwrap();
        assert!(ledger.latest(SkuId::new(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn same_date_resolves_to_most_recent_append() {
        let ledger = InMemoryMarginLedger::new();
        ledger.append(new_entry(1, dec!(0.10), Some("2024-02-01"))).await.unwrap();
        let second = ledger.append(new_entry(1, dec!(0.12), Some("2024-02-01"))).await.unwrap();

        let latest = ledger.latest(SkuId::new(1)).await.unwrap().unwrap();
        assert_eq!(latest.id, second.id);
        let on_date = ledger.by_date(SkuId::new(1), date("2024-02-01")).await.unwrap().unwrap();
        assert_eq!(on_date.id, second.id);
    }

    #[tokio::test]
    async fn missing_target_date_defaults_to_today() {
        let ledger = InMemoryMarginLedger::new();
        let stored = ledger.append(new_entry(1, dec!(0.1), None)).await.unwrap();
        assert_eq!(stored.target_date, stored.created_at.date_naive());
    }

    #[tokio::test]
    async fn by_date_is_exact() {
        let ledger = InMemoryMarginLedger::new();
        ledger.append(new_entry(1, dec!(0.1), Some("2024-03-01"))).await.unwrap();
        assert!(ledger.by_date(SkuId::new(1), date("2024-03-02")).await.unwrap().is_none());
        assert!(ledger.by_date(SkuId::new(1), date("2024-03-01")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn all_for_sku_is_in_ledger_order() {
        let ledger = InMemoryMarginLedger::new();
        ledger.append(new_entry(1, dec!(0.3), Some("2024-01-03"))).await.unwrap();
        ledger.append(new_entry(1, dec!(0.1), Some("2024-01-01"))).await.unwrap();
        ledger.append(new_entry(9, dec!(0.9), Some("2024-01-01"))).await.unwrap();

        let all = ledger.all_for_sku(SkuId::new(1)).await.unwrap();
        let dates: Vec<NaiveDate> = all.iter().map(|e| e.target_date).collect();
        assert_eq!(dates, vec![date("2024-01-01"), date("2024-01-03")]);
    }

    #[tokio::test]
    async fn page_filters_by_date_and_orders_by_sku() {
        let ledger = InMemoryMarginLedger::new();
        for sku in [5, 3, 1, 4, 2] {
            ledger.append(new_entry(sku, dec!(0.1), Some("2024-04-01"))).await.unwrap();
        }
        ledger.append(new_entry(1, dec!(0.1), Some("2024-04-02"))).await.unwrap();

        let first = ledger.page(date("2024-04-01"), PageRequest::new(1, 2)).await.unwrap();
        let skus: Vec<i64> = first.iter().map(|e| e.sku_id.get()).collect();
        assert_eq!(skus, vec![1, 2]);

        let third = ledger.page(date("2024-04-01"), PageRequest::new(3, 2)).await.unwrap();
        let skus: Vec<i64> = third.iter().map(|e| e.sku_id.get()).collect();
        assert_eq!(skus, vec![5]);

        let clamped = ledger.page(date("2024-04-01"), PageRequest::new(0, 2)).await.unwrap();
        assert_eq!(clamped, first);
    }

    #[tokio::test]
    async fn page_all_spans_every_date() {
        let ledger = InMemoryMarginLedger::new();
        ledger.append(new_entry(2, dec!(0.1), Some("2024-04-01"))).await.unwrap();
        ledger.append(new_entry(1, dec!(0.1), Some("2024-04-02"))).await.unwrap();

        let all = ledger.page_all(PageRequest::default()).await.unwrap();
        let skus: Vec<i64> = all.iter().map(|e| e.sku_id.get()).collect();
        assert_eq!(skus, vec![1, 2]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_for_one_sku_get_distinct_sequences() {
        let ledger = Arc::new(InMemoryMarginLedger::new());

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let ledger = ledger.clone();
                tokio::spawn(async move {
                    ledger
                        .append(new_entry(1, Decimal::new(i, 2), Some("2024-05-01")))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut stored = Vec::new();
        for h in handles {
            stored.push(h.await.unwrap());
        }

        let sequences: HashSet<u64> = stored.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences.len(), 32);

        let newest = stored.iter().max_by_key(|e| e.sequence).unwrap();
        let latest = ledger.latest(SkuId::new(1)).await.unwrap().unwrap();
        assert_eq!(latest.id, newest.id);
    }
}
