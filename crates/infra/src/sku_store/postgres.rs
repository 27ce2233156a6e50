//! Postgres-backed SKU store (`rc_sku` table).
//!
//! De-duplication by SKU code relies on the unique index on `rc_sku.sku`:
//! conflicting rows are skipped with `ON CONFLICT DO NOTHING`, and the whole
//! batch is written in one transaction.

use std::sync::Arc;

use sqlx::{PgPool, Row};
use tracing::instrument;

use skumargin_core::SkuId;
use skumargin_inventory::{NewSkuRecord, SkuRecord};

use super::r#trait::SkuStore;
use crate::error::{StoreError, map_sqlx_error};
use crate::pagination::PageRequest;

const SKU_COLUMNS: &str = r#"
    id,
    sku,
    planned_orders,
    planned_orders_per_sku,
    actual_orders,
    stock,
    planned_margin,
    margin_yesterday,
    margin_week,
    drr,
    min_bid_tft,
    bid_yesterday,
    current_price,
    retail_price_rp
"#;

#[derive(Debug, Clone)]
pub struct PostgresSkuStore {
    pool: Arc<PgPool>,
}

impl PostgresSkuStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl SkuStore for PostgresSkuStore {
    #[instrument(skip(self), fields(sku_id = %sku_id), err)]
    async fn get(&self, sku_id: SkuId) -> Result<Option<SkuRecord>, StoreError> {
        let row = sqlx::query(&format!("SELECT {SKU_COLUMNS} FROM rc_sku WHERE id = $1"))
            .bind(sku_id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_sku", e))?;

        row.map(|r| sku_from_row(&r)).transpose()
    }

    #[instrument(skip(self), fields(page = page.number(), per_page = page.size()), err)]
    async fn page(&self, page: PageRequest) -> Result<Vec<SkuRecord>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {SKU_COLUMNS} FROM rc_sku ORDER BY id ASC LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("page_sku", e))?;

        rows.iter().map(sku_from_row).collect()
    }

    #[instrument(skip(self, records), fields(batch = records.len()), err)]
    async fn insert_batch(&self, records: Vec<NewSkuRecord>) -> Result<usize, StoreError> {
        for rec in &records {
            rec.validate()?;
        }
        if records.is_empty() {
            return Ok(0);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let mut inserted = 0usize;
        for rec in records {
            let result = sqlx::query(
                r#"
                INSERT INTO rc_sku (
                    sku,
                    planned_orders,
                    planned_orders_per_sku,
                    actual_orders,
                    stock,
                    planned_margin,
                    margin_yesterday,
                    margin_week,
                    drr,
                    min_bid_tft,
                    bid_yesterday,
                    current_price,
                    retail_price_rp
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                ON CONFLICT (sku) DO NOTHING
                "#,
            )
            .bind(rec.code())
            .bind(rec.planned_orders)
            .bind(rec.planned_orders_per_sku)
            .bind(rec.actual_orders)
            .bind(rec.stock)
            .bind(rec.planned_margin)
            .bind(rec.margin_yesterday)
            .bind(rec.margin_week)
            .bind(rec.drr)
            .bind(rec.min_bid_tft)
            .bind(rec.bid_yesterday)
            .bind(rec.current_price)
            .bind(rec.retail_price_rp)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_sku", e))?;

            if result.rows_affected() == 0 {
                tracing::debug!(sku = rec.code(), "sku already exists, skipping");
            } else {
                inserted += 1;
            }
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        tracing::debug!(inserted, "sku batch stored");
        Ok(inserted)
    }
}

fn sku_from_row(row: &sqlx::postgres::PgRow) -> Result<SkuRecord, StoreError> {
    let decode = |e: sqlx::Error| StoreError::Database(format!("failed to decode sku row: {e}"));
    Ok(SkuRecord {
        id: SkuId::new(row.try_get("id").map_err(decode)?),
        sku: row.try_get("sku").map_err(decode)?,
        planned_orders: row.try_get("planned_orders").map_err(decode)?,
        planned_orders_per_sku: row.try_get("planned_orders_per_sku").map_err(decode)?,
        actual_orders: row.try_get("actual_orders").map_err(decode)?,
        stock: row.try_get("stock").map_err(decode)?,
        planned_margin: row.try_get("planned_margin").map_err(decode)?,
        margin_yesterday: row.try_get("margin_yesterday").map_err(decode)?,
        margin_week: row.try_get("margin_week").map_err(decode)?,
        drr: row.try_get("drr").map_err(decode)?,
        min_bid_tft: row.try_get("min_bid_tft").map_err(decode)?,
        bid_yesterday: row.try_get("bid_yesterday").map_err(decode)?,
        current_price: row.try_get("current_price").map_err(decode)?,
        retail_price_rp: row.try_get("retail_price_rp").map_err(decode)?,
    })
}
