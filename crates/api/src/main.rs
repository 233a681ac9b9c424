use anyhow::Context;

use lustre_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    lustre_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let services = lustre_api::app::services::build_services(&config).await?;
    let app = lustre_api::app::build_app(config.jwt_secret.clone(), services);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
