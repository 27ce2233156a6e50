use anyhow::Context;

use skumargin_api::app::AdmissionLimit;
use skumargin_infra::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env().context("invalid configuration")?;
    skumargin_observability::init(&settings.log_level);

    let services = skumargin_api::app::services::build_services(&settings)
        .await
        .context("failed to initialise stores")?;
    let limit = AdmissionLimit::new(
        settings.max_concurrent_requests,
        settings.max_concurrent_wait,
    );
    let app = skumargin_api::app::build_app(services, limit);

    let listener = tokio::net::TcpListener::bind(settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
