use campus_journal::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    repository::{PostgresRepository, RepositoryState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Initializes configuration, logging, the database and the HTTP server, in that order.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // RUST_LOG wins; otherwise fall back to verbose local defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "campus_journal=debug,tower_http=info,axum=trace".into());

    // 3. Logging Format per Environment
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // JSON lines for the log aggregator.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);
    if config.admin_emails.is_empty() {
        tracing::info!("No ADMIN_EMAILS configured; only the first account becomes admin");
    }

    // 4. Database Initialization (Postgres)
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    let postgres = PostgresRepository::new(pool);
    postgres
        .migrate()
        .await
        .expect("FATAL: Failed to apply database migrations.");

    let repo = Arc::new(postgres) as RepositoryState;

    // 5. Router and Server Startup
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState::new(repo, config));

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
