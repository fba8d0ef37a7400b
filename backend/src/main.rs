use std::sync::Arc;

use prioritymatrix::api::router;
use prioritymatrix::config::{AppConfig, StoreConfig};
use prioritymatrix::services::BoardSession;
use prioritymatrix::state::AppState;
use prioritymatrix::store::{SqliteTaskStore, SupabaseTaskStore, TaskStore};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "prioritymatrix=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let store: Arc<dyn TaskStore> = match config.store {
        StoreConfig::Sqlite { database_url } => {
            info!("using SQLite task store at {}", database_url);
            Arc::new(SqliteTaskStore::connect(&database_url).await?)
        }
        StoreConfig::Supabase(supabase) => {
            info!("using Supabase task store at {}", supabase.url);
            Arc::new(SupabaseTaskStore::new(supabase)?)
        }
    };

    let board = Arc::new(BoardSession::new(store));
    if let Err(e) = board.refresh().await {
        warn!("initial task fetch failed: {}", e);
    }

    let app = router(AppState { board });

    info!("listening on http://{}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
