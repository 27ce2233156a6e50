use std::sync::Arc;

use chrono::NaiveDate;

use skumargin_core::SkuId;
use skumargin_pricing::{MarginHistoryEntry, NewMarginEntry};

use crate::error::StoreError;
use crate::pagination::PageRequest;

/// Margin history ledger.
///
/// ## Append guarantees
///
/// - Appends for one SKU are serialized; every entry gets a distinct,
///   strictly increasing `sequence`.
/// - An append either fully succeeds (visible to subsequent `latest`/`by_date`)
///   or fully fails with nothing visible.
/// - A missing `target_date` defaults to the processing date.
#[async_trait::async_trait]
pub trait MarginLedger: Send + Sync {
    async fn append(&self, entry: NewMarginEntry) -> Result<MarginHistoryEntry, StoreError>;

    /// Greatest `target_date`, ties broken by greatest `sequence`. `None` for a SKU without history.
    async fn latest(&self, sku_id: SkuId) -> Result<Option<MarginHistoryEntry>, StoreError>;

    /// Exact match on `target_date` (newest entry when several share the date).
    async fn by_date(
        &self,
        sku_id: SkuId,
        date: NaiveDate,
    ) -> Result<Option<MarginHistoryEntry>, StoreError>;

    /// All entries of one SKU in ledger order.
    async fn all_for_sku(&self, sku_id: SkuId) -> Result<Vec<MarginHistoryEntry>, StoreError>;

    /// Entries for one `target_date`, ordered by `sku_id`.
    async fn page(
        &self,
        date: NaiveDate,
        page: PageRequest,
    ) -> Result<Vec<MarginHistoryEntry>, StoreError>;

    /// All entries, ordered by `sku_id` then ledger order.
    async fn page_all(&self, page: PageRequest) -> Result<Vec<MarginHistoryEntry>, StoreError>;
}

#[async_trait::async_trait]
impl<L> MarginLedger for Arc<L>
where
    L: MarginLedger + ?Sized,
{
    async fn append(&self, entry: NewMarginEntry) -> Result<MarginHistoryEntry, StoreError> {
        (**self).append(entry).await
    }

    async fn latest(&self, sku_id: SkuId) -> Result<Option<MarginHistoryEntry>, StoreError> {
        (**self).latest(sku_id).await
    }

    async fn by_date(
        &self,
        sku_id: SkuId,
        date: NaiveDate,
    ) -> Result<Option<MarginHistoryEntry>, StoreError> {
        (**self).by_date(sku_id, date).await
    }

    async fn all_for_sku(&self, sku_id: SkuId) -> Result<Vec<MarginHistoryEntry>, StoreError> {
        (**self).all_for_sku(sku_id).await
    }

    async fn page(
        &self,
        date: NaiveDate,
        page: PageRequest,
    ) -> Result<Vec<MarginHistoryEntry>, StoreError> {
        (**self).page(date, page).await
    }

    async fn page_all(&self, page: PageRequest) -> Result<Vec<MarginHistoryEntry>, StoreError> {
        (**self).page_all(page).await
    }
}
