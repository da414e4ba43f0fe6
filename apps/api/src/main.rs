use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;
mod seed;

use shared_config::AppConfig;
use shared_database::database::{init_pool, run_migrations, DatabaseConfig};
use shared_database::{InMemoryStore, PgSchedulingStore, SchedulingStore};
use shared_utils::{AppState, Clock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Agenda scheduling API server");

    let config = AppConfig::from_env();
    let store = build_store(&config).await?;

    if !store.health_check().await.context("store health check failed")? {
        warn!("Store health check reported unhealthy");
    }

    let state = Arc::new(AppState::new(config.clone(), store));

    if config.seed_demo_data {
        let today = state.clock.today();
        if seed::seed_demo_data(state.store.as_ref(), today).await? {
            info!("Demo data seeded");
        }
    }

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn SchedulingStore>> {
    match DatabaseConfig::from_app_config(config) {
        Some(db_config) => {
            let pool = init_pool(&db_config).await?;
            run_migrations(&pool).await?;
            info!("Using PostgreSQL store");
            Ok(Arc::new(PgSchedulingStore::new(pool)))
        }
        None => {
            info!("Using in-memory store; data is lost on restart");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}
