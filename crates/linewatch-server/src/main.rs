use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use linewatch_api::auth::{self, AppState, AppStateInner};
use linewatch_api::middleware::require_auth;
use linewatch_api::{predictions, reports, votes};

const DEV_JWT_SECRET: &str = "dev-secret-change-me";

// Tracing targets carry the crate name with underscores, so the default
// filter must spell the members out; a bare "linewatch=" prefix would
// match none of them
const DEFAULT_LOG_FILTER: &str =
    "linewatch_server=debug,linewatch_api=debug,linewatch_db=debug,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("LINEWATCH_JWT_SECRET").unwrap_or_else(|_| DEV_JWT_SECRET.into());
    if jwt_secret == DEV_JWT_SECRET {
        warn!("LINEWATCH_JWT_SECRET is unset; tokens are signed with the dev placeholder");
    }
    let db_path = std::env::var("LINEWATCH_DB_PATH").unwrap_or_else(|_| "linewatch.db".into());
    let host = std::env::var("LINEWATCH_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("LINEWATCH_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = linewatch_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner { db, jwt_secret });

    // Routes. Listing and predictions are public; a bearer token on the
    // listing upgrades it with per-user vote state.
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/reports", get(reports::list_reports))
        .route("/predictions", get(predictions::get_predictions))
        .route("/health", get(health))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/users/me", get(auth::me))
        .route("/reports", post(reports::create_report))
        .route("/reports/{report_id}/votes", post(votes::cast_vote))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Linewatch server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn health() -> &'static str {
    "OK"
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
