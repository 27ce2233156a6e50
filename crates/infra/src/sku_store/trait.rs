use std::sync::Arc;

use skumargin_core::SkuId;
use skumargin_inventory::{NewSkuRecord, SkuRecord, SkuSnapshot};

use crate::error::StoreError;
use crate::pagination::PageRequest;

/// SKU record store.
///
/// Records are written by ingestion only; margin calculation reads snapshots.
#[async_trait::async_trait]
pub trait SkuStore: Send + Sync {
    async fn get(&self, sku_id: SkuId) -> Result<Option<SkuRecord>, StoreError>;

    /// Records ordered by id.
    async fn page(&self, page: PageRequest) -> Result<Vec<SkuRecord>, StoreError>;

    /// Insert a batch, skipping records whose `sku` code already exists.
    ///
    /// The whole batch is validated before anything is written. Returns the
    /// number of inserted records.
    async fn insert_batch(&self, records: Vec<NewSkuRecord>) -> Result<usize, StoreError>;

    async fn fetch_snapshot(&self, sku_id: SkuId) -> Result<Option<SkuSnapshot>, StoreError> {
        Ok(self.get(sku_id).await?.map(|r| r.snapshot()))
    }
}

#[async_trait::async_trait]
impl<S> SkuStore for Arc<S>
where
    S: SkuStore + ?Sized,
{
    async fn get(&self, sku_id: SkuId) -> Result<Option<SkuRecord>, StoreError> {
        (**self).get(sku_id).await
    }

    async fn page(&self, page: PageRequest) -> Result<Vec<SkuRecord>, StoreError> {
        (**self).page(page).await
    }

    async fn insert_batch(&self, records: Vec<NewSkuRecord>) -> Result<usize, StoreError> {
        (**self).insert_batch(records).await
    }

    async fn fetch_snapshot(&self, sku_id: SkuId) -> Result<Option<SkuSnapshot>, StoreError> {
        (**self).fetch_snapshot(sku_id).await
    }
}
