//! Postgres pool construction and schema bootstrap.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::instrument;

use crate::config::Settings;
use crate::error::{StoreError, map_sqlx_error};

const MAX_CONNECTIONS: u32 = 10;

/// Open a pool against the database described by `settings`.
pub async fn connect(settings: &Settings) -> Result<PgPool, StoreError> {
    let url = settings
        .database_url()
        .ok_or_else(|| StoreError::Database("database settings are incomplete".to_string()))?;

    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(&url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))
}

/// Create the SKU and margin history tables when they are missing.
#[instrument(skip(pool), err)]
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS rc_sku (
            id                     BIGSERIAL PRIMARY KEY,
            sku                    VARCHAR(50) NOT NULL UNIQUE,
            planned_orders         BIGINT NULL,
            planned_orders_per_sku BIGINT NOT NULL DEFAULT 0,
            actual_orders          BIGINT NOT NULL DEFAULT 0,
            stock                  BIGINT NOT NULL DEFAULT 0 CHECK (stock >= 0),
            planned_margin         NUMERIC(10, 2) NULL,
            margin_yesterday       NUMERIC(10, 2) NULL,
            margin_week            NUMERIC(10, 2) NULL,
            drr                    NUMERIC(10, 4) NULL,
            min_bid_tft            NUMERIC(10, 2) NULL,
            bid_yesterday          NUMERIC(10, 2) NULL,
            current_price          NUMERIC(10, 2) NULL,
            retail_price_rp        NUMERIC(10, 2) NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| map_sqlx_error("create_rc_sku", e))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS rc_sku_margin_history (
            id             UUID PRIMARY KEY,
            sequence       BIGSERIAL NOT NULL UNIQUE,
            sku_id         BIGINT NOT NULL REFERENCES rc_sku(id) ON DELETE CASCADE,
            margin_percent NUMERIC NOT NULL,
            target_date    DATE NOT NULL DEFAULT CURRENT_DATE,
            created_at     TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| map_sqlx_error("create_rc_sku_margin_history", e))?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS rc_sku_margin_history_ledger_idx
            ON rc_sku_margin_history (sku_id, target_date, sequence)
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| map_sqlx_error("create_ledger_index", e))?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS rc_sku_margin_history_date_idx
            ON rc_sku_margin_history (target_date, sku_id)
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| map_sqlx_error("create_date_index", e))?;

    tracing::info!("database schema ready");
    Ok(())
}
