//! Store selection and service wiring.
//!
//! In-memory stores are the default; `USE_PERSISTENT_STORES=true` switches
//! both the SKU store and the margin ledger to Postgres.

use std::sync::Arc;

use skumargin_infra::{
    InMemoryMarginLedger, InMemorySkuStore, MarginLedger, MarginService, PostgresMarginLedger,
    PostgresSkuStore, Settings, SkuStore, StoreError, db,
};
use skumargin_pricing::MarginPolicy;

/// Margin service over type-erased stores, so both backends share one type.
pub type DynMarginService = MarginService<Arc<dyn SkuStore>, Arc<dyn MarginLedger>>;

pub struct AppServices {
    pub margin: DynMarginService,
    /// Page size used by listing endpoints.
    pub page_size: u32,
    pub backend: &'static str,
}

impl AppServices {
    pub fn in_memory(policy: MarginPolicy, page_size: u32) -> Self {
        let skus: Arc<dyn SkuStore> = Arc::new(InMemorySkuStore::new());
        let ledger: Arc<dyn MarginLedger> = Arc::new(InMemoryMarginLedger::new());
        Self {
            margin: MarginService::new(skus, ledger, policy),
            page_size,
            backend: "in_memory",
        }
    }

    pub fn skus(&self) -> &Arc<dyn SkuStore> {
        self.margin.skus()
    }

    pub fn ledger(&self) -> &Arc<dyn MarginLedger> {
        self.margin.ledger()
    }
}

pub async fn build_services(settings: &Settings) -> Result<AppServices, StoreError> {
    let services = if settings.use_persistent_stores {
        build_persistent_services(settings).await?
    } else {
        AppServices::in_memory(settings.policy.clone(), settings.page_size)
    };

    tracing::info!(
        backend = services.backend,
        page_size = services.page_size,
        "services ready"
    );
    Ok(services)
}

async fn build_persistent_services(settings: &Settings) -> Result<AppServices, StoreError> {
    let pool = db::connect(settings).await?;
    db::ensure_schema(&pool).await?;

    let skus: Arc<dyn SkuStore> = Arc::new(PostgresSkuStore::new(pool.clone()));
    let ledger: Arc<dyn MarginLedger> = Arc::new(PostgresMarginLedger::new(pool));

    Ok(AppServices {
        margin: MarginService::new(skus, ledger, settings.policy.clone()),
        page_size: settings.page_size,
        backend: "postgres",
    })
}
