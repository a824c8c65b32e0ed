//! API Server Entry Point
//!
//! Loads configuration, runs migrations and the retention purge, and serves
//! the admission API. Uses `anyhow` for startup errors; request errors are
//! `admission::AdmissionError` rendered as `kernel` JSON error bodies.

mod config;

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use admission::{PgAdmissionRepository, PurgeStaleUseCase, admission_router};
use axum::{
    Router, http,
    http::{HeaderName, Method, header},
};
use platform::clock::SystemClock;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,admission=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let admission_config = config::admission_config()?;
    let notifier = config::mail_notifier(&admission_config)?;
    let claims_issuer = config::claims_issuer(&admission_config)?;

    // Database connection
    let database_url = env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set in environment"))?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let store = PgAdmissionRepository::with_retry(pool, admission_config.store_retry.clone());

    // Startup purge, then on an interval. Failures never stop the server.
    let purge = PurgeStaleUseCase::new(
        Arc::new(store.clone()),
        Arc::new(SystemClock),
        Arc::new(admission_config.clone()),
    );
    run_purge(&purge).await;
    let purge_interval = admission_config.retention.purge_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(purge_interval);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            run_purge(&purge).await;
        }
    });

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:40922,http://127.0.0.1:40922".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([Method::POST, Method::OPTIONS]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            HeaderName::from_static("x-client-attestation"),
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .nest(
            "/api/admission",
            admission_router(store, notifier, claims_issuer, admission_config),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = config::listen_addr()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn run_purge(purge: &PurgeStaleUseCase<PgAdmissionRepository>) {
    if let Err(e) = purge.execute().await {
        tracing::warn!(error = %e, "Retention purge failed, continuing anyway");
    }
}
