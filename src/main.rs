use person_api::config::Config;
use person_api::db::Database;
use person_api::db_storage::PgPersonStore;
use person_api::enrichment::NameEnricher;
use person_api::handlers::{self, AppState};
use person_api::person_service::PersonService;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the application.
///
/// Initializes logging, configuration, the database pool and migrations,
/// the enrichment client, then serves the router until Ctrl-C. Any failure
/// before the listener is bound aborts startup.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // LOG_FORMAT is read before Config so that config loading itself is logged
    dotenvy::dotenv().ok();
    init_tracing(
        std::env::var("LOG_FORMAT")
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(false),
    );

    let config = Config::from_env()?;

    let db = Database::new(&config.database_url, config.db_max_connections).await?;
    tracing::info!("Database connection pool established");

    if config.run_migrations {
        tracing::info!("Running migrations...");
        db.migrate().await?;
        tracing::info!("Migrations applied");
    } else {
        tracing::warn!("RUN_MIGRATIONS=false, skipping schema migrations");
    }

    let enricher = NameEnricher::from_config(&config)?;
    if enricher.is_enabled() {
        tracing::info!(
            "✓ Enrichment enabled: {} / {}",
            config.genderize_url,
            config.nationalize_url
        );
    } else {
        tracing::info!("Enrichment disabled");
    }

    let store = Arc::new(PgPersonStore::new(db.pool.clone()));
    let app_state = Arc::new(AppState::new(PersonService::new(store, enricher)));
    let app = handlers::router(app_state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "person_api=debug,tower_http=debug".into());

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
