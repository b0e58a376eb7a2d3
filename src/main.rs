use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use consent_logger::config::AppConfig;
use consent_logger::db;
use consent_logger::geo::NoopGeoLocator;
use consent_logger::routes;
use consent_logger::state::AppState;
use consent_logger::store::PgStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "api",
        database_url = %config.redacted_database_url(),
        pool_size = config.database_max_pool_size,
        statement_timeout_ms = config.database_statement_timeout_ms,
        server_host = %config.server_host,
        server_port = config.server_port,
        admin_key_configured = config.admin_key.is_some(),
        allowed_origins = ?config.allowed_origins,
        document_version = %config.document_version,
        "loaded consent logger configuration"
    );
    if config.admin_key.is_none() {
        tracing::warn!("ADMIN_API_KEY is not set; admin endpoints will reject every request");
    }

    let pool = db::init_pool_with(
        &config.database_url,
        config.database_max_pool_size,
        config.statement_timeout(),
    )?;
    {
        let pool = pool.clone();
        tokio::task::spawn_blocking(move || db::run_migrations(&pool)).await??;
    }

    let store = Arc::new(PgStore::new(pool));
    let listen_addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port).parse()?;
    let state = AppState::new(config, store.clone(), store, Arc::new(NoopGeoLocator));
    let router = routes::create_router(state);

    let listener = TcpListener::bind(listen_addr).await?;
    tracing::info!("listening on {}", listen_addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    tracing::info!("received shutdown signal");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
