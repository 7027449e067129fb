use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use catalog_service::{
    config::Config,
    db::PgImageStore,
    routes::build_router,
    storage::CloudinaryStorage,
    AppState,
};
use shared::database::{close_connections, create_connection_pool, run_migrations, test_connection};
use shared::observability::{init_logging, LogConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;
    init_logging(&LogConfig::new("catalog-service", config.log_level, config.log_format))?;

    info!("Starting catalog service...");
    info!(
        database = %config.database.database_name,
        folder = %config.storage.folder,
        legacy_status_codes = config.server.legacy_status_codes,
        "Configuration loaded"
    );

    let pool = create_connection_pool(&config.database)
        .await
        .context("Failed to connect to database")?;
    test_connection(&pool).await?;

    run_migrations(&pool, &sqlx::migrate!("./migrations")).await?;

    let storage = CloudinaryStorage::new(&config.storage)?;

    let state = Arc::new(AppState {
        store: Arc::new(PgImageStore::new(pool.clone())),
        storage: Arc::new(storage),
        legacy_status_codes: config.server.legacy_status_codes,
    });

    let app = build_router(state);

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Catalog service listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_connections(&pool).await;
    info!("Catalog service stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
