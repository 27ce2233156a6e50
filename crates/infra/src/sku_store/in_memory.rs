use std::collections::{BTreeMap, HashSet};
use std::sync::RwLock;

use skumargin_core::SkuId;
use skumargin_inventory::{NewSkuRecord, SkuRecord};

use super::r#trait::SkuStore;
use crate::error::StoreError;
use crate::pagination::PageRequest;

#[derive(Debug)]
struct Inner {
    records: BTreeMap<SkuId, SkuRecord>,
    next_id: i64,
}

/// In-memory SKU store.
///
/// Intended for tests/dev. Ids are assigned from 1 upwards.
#[derive(Debug)]
pub struct InMemorySkuStore {
    inner: RwLock<Inner>,
}

impl InMemorySkuStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                records: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for InMemorySkuStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SkuStore for InMemorySkuStore {
    async fn get(&self, sku_id: SkuId) -> Result<Option<SkuRecord>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(inner.records.get(&sku_id).cloned())
    }

    async fn page(&self, page: PageRequest) -> Result<Vec<SkuRecord>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(page.apply(inner.records.values().cloned().collect()))
    }

    async fn insert_batch(&self, records: Vec<NewSkuRecord>) -> Result<usize, StoreError> {
        for rec in &records {
            rec.validate()?;
        }

        let mut inner = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        let mut seen: HashSet<String> = inner.records.values().map(|r| r.sku.clone()).collect();

        let mut inserted = 0;
        for rec in records {
            if !seen.insert(rec.code().to_string()) {
                tracing::debug!(sku = rec.code(), "sku already exists, skipping");
                continue;
            }
            let id = SkuId::new(inner.next_id);
            inner.next_id += 1;
            inner.records.insert(id, rec.into_record(id));
            inserted += 1;
        }

        tracing::debug!(inserted, "sku batch stored");
        Ok(inserted)
    }
}
