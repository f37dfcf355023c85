use std::sync::Arc;

use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use newsline::adapters::build_http_client;
use newsline::article::PlaceholderImages;
use newsline::cache::TtlCache;
use newsline::config::Config;
use newsline::db::Database;
use newsline::fallback::FallbackGenerator;
use newsline::feeds::FeedRegistry;
use newsline::routes::{self, AppState};
use newsline::service::AggregationService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "newsline=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::var("NEWSLINE_CONFIG").unwrap_or_else(|_| "feeds.toml".to_string());
    let config = Config::load(&config_path)?;
    info!("Loaded {} feeds from {}", config.feeds.len(), config_path);

    // Initialize database
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| config.database_url.clone());
    let db = Database::new(&database_url).await?;
    db.initialize().await?;
    info!("Database initialized");

    let db = Arc::new(db);

    let client = build_http_client()?;
    let feeds = Arc::new(FeedRegistry::from_config(&config, client, db.clone())?);

    let placeholders = PlaceholderImages::new(config.sources.placeholder_base.clone());
    let service = Arc::new(AggregationService::new(
        TtlCache::new(db.clone()),
        config.retry.policy(),
        FallbackGenerator::new(placeholders),
        config.synthetic_count,
    ));

    let state = Arc::new(AppState { service, feeds });
    let app = routes::router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!("Server starting on http://{}", config.listen_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
