//! Server: reads settings from the environment, prepares storage, serves the API.

use myapp::{app, ensure_database_exists, ensure_entity_tables, AppState, MemoryRepository, PgRepository, Repository, Settings, StorageKind};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("myapp=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    match settings.storage {
        StorageKind::Postgres => {
            ensure_database_exists(&settings.database_url).await?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(settings.max_connections)
                .connect(&settings.database_url)
                .await?;
            ensure_entity_tables(&pool, &settings.db_schema).await?;
            let repo = PgRepository::new(pool, settings.db_schema.clone());
            serve(repo, settings).await
        }
        StorageKind::Memory => {
            tracing::warn!("using in-memory storage; data is lost on exit");
            serve(MemoryRepository::new(), settings).await
        }
    }
}

async fn serve<R: Repository>(repo: R, settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let bind_addr = settings.bind_addr;
    let state = AppState::new(repo, settings)?;
    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
