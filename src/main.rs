use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

use agrotrade_api::api::create_router;
use agrotrade_api::config::Config;
use agrotrade_api::infrastructure::cache::RedisTokenStore;
use agrotrade_api::state::{Adapters, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("agrotrade_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database connected and migrated");

    tracing::info!("Connecting to redis...");
    let redis = RedisTokenStore::connect(&config.redis_url).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let adapters = Adapters::production(&config, pool, redis);
    let app = create_router(AppState::new(config, adapters));

    // Start server
    tracing::info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
