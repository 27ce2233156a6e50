//! Postgres-backed margin ledger (`rc_sku_margin_history` table).
//!
//! ## Append serialization
//!
//! `append()` runs in a transaction that first takes a transaction-scoped
//! advisory lock keyed by the SKU id, so appends for one SKU never interleave.
//! `sequence` is a `BIGSERIAL` drawn while the lock is held, which makes it
//! agree with commit order per SKU. A failed insert rolls back with nothing
//! visible.
//!
//! ## Thread Safety
//!
//! Uses SQLx connection pool which is thread-safe (Arc + Send + Sync).

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use tracing::instrument;

use skumargin_core::{MarginEntryId, SkuId};
use skumargin_pricing::{MarginHistoryEntry, NewMarginEntry};

use super::r#trait::MarginLedger;
use crate::error::{StoreError, map_sqlx_error};
use crate::pagination::PageRequest;

const ENTRY_COLUMNS: &str = "id, sequence, sku_id, margin_percent, target_date, created_at";

#[derive(Debug, Clone)]
pub struct PostgresMarginLedger {
    pool: Arc<PgPool>,
}

impl PostgresMarginLedger {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl MarginLedger for PostgresMarginLedger {
    #[instrument(
        skip(self, entry),
        fields(sku_id = %entry.sku_id, target_date = ?entry.target_date),
        err
    )]
    async fn append(&self, entry: NewMarginEntry) -> Result<MarginHistoryEntry, StoreError> {
        let id = MarginEntryId::new();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(entry.sku_id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_sku", e))?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO rc_sku_margin_history (id, sku_id, margin_percent, target_date)
            VALUES ($1, $2, $3, COALESCE($4::date, CURRENT_DATE))
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(entry.sku_id.get())
        .bind(entry.margin_percent)
        .bind(entry.target_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_margin_entry", e))?;

        let stored = entry_from_row(&row)?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        tracing::info!(entry_id = %stored.id, "margin history entry created");
        Ok(stored)
    }

    #[instrument(skip(self), fields(sku_id = %sku_id), err)]
    async fn latest(&self, sku_id: SkuId) -> Result<Option<MarginHistoryEntry>, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM rc_sku_margin_history
            WHERE sku_id = $1
            ORDER BY target_date DESC, sequence DESC
            LIMIT 1
            "#
        ))
        .bind(sku_id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("latest_margin_entry", e))?;

        match row {
            Some(row) => Ok(Some(entry_from_row(&row)?)),
            None => {
                tracing::warn!("no margin history found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self), fields(sku_id = %sku_id, date = %date), err)]
    async fn by_date(
        &self,
        sku_id: SkuId,
        date: NaiveDate,
    ) -> Result<Option<MarginHistoryEntry>, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM rc_sku_margin_history
            WHERE sku_id = $1 AND target_date = $2
            ORDER BY sequence DESC
            LIMIT 1
            "#
        ))
        .bind(sku_id.get())
        .bind(date)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("margin_entry_by_date", e))?;

        row.map(|r| entry_from_row(&r)).transpose()
    }

    #[instrument(skip(self), fields(sku_id = %sku_id), err)]
    async fn all_for_sku(&self, sku_id: SkuId) -> Result<Vec<MarginHistoryEntry>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM rc_sku_margin_history
            WHERE sku_id = $1
            ORDER BY target_date ASC, sequence ASC
            "#
        ))
        .bind(sku_id.get())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("margin_entries_for_sku", e))?;

        rows.iter().map(entry_from_row).collect()
    }

    #[instrument(skip(self), fields(date = %date, page = page.number(), per_page = page.size()), err)]
    async fn page(
        &self,
        date: NaiveDate,
        page: PageRequest,
    ) -> Result<Vec<MarginHistoryEntry>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM rc_sku_margin_history
            WHERE target_date = $1
            ORDER BY sku_id ASC, sequence ASC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(date)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("margin_entries_page", e))?;

        rows.iter().map(entry_from_row).collect()
    }

    #[instrument(skip(self), fields(page = page.number(), per_page = page.size()), err)]
    async fn page_all(&self, page: PageRequest) -> Result<Vec<MarginHistoryEntry>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM rc_sku_margin_history
            ORDER BY sku_id ASC, target_date ASC, sequence ASC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("margin_entries_page_all", e))?;

        rows.iter().map(entry_from_row).collect()
    }
}

fn entry_from_row(row: &sqlx::postgres::PgRow) -> Result<MarginHistoryEntry, StoreError> {
    let decode = |e: sqlx::Error| {
        StoreError::Database(format!("failed to decode margin history row: {e}"))
    };

    let id: uuid::Uuid = row.try_get("id").map_err(decode)?;
    let sequence: i64 = row.try_get("sequence").map_err(decode)?;
    let sku_id: i64 = row.try_get("sku_id").map_err(decode)?;
    let margin_percent: Decimal = row.try_get("margin_percent").map_err(decode)?;
    let target_date: NaiveDate = row.try_get("target_date").map_err(decode)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;

    Ok(MarginHistoryEntry {
        id: MarginEntryId::from_uuid(id),
        sku_id: SkuId::new(sku_id),
        margin_percent,
        target_date,
        sequence: sequence as u64,
        created_at,
    })
}
