use std::sync::Arc;

use tasknator_infra::{AppConfig, RedisQueue};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tasknator_observability::init();

    let config = AppConfig::from_env()?;
    let token = config.require_api_token()?.to_string();

    let queue = RedisQueue::connect(&config.redis_url).await?;
    let app = tasknator_api::app::build_app(Arc::new(queue), token);

    let listener = tokio::net::TcpListener::bind(config.api_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "jobs api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
