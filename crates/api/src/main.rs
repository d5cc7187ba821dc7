use anyhow::Context;

use storefront_infra::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal outside local development.
    let _ = dotenvy::dotenv();

    let settings = Settings::from_env().context("invalid configuration")?;
    storefront_observability::init(settings.log_format);

    if settings.jwt_secret_is_default {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
    }

    let app = storefront_api::app::build_app(&settings)
        .await
        .context("failed to wire services")?;

    let listener = tokio::net::TcpListener::bind(settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        persistent = settings.use_persistent_stores,
        "listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
