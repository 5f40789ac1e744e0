//! HTTP server: shared state, router and lifecycle

use crate::{
    config::Config,
    error::{AppError, Result},
    routes,
    storage::Database,
};
use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::{net::TcpListener, signal, sync::Mutex};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// State shared across all handlers
pub struct AppState {
    pub config: Config,
    pub database: Arc<Mutex<Database>>,
}

impl AppState {
    pub fn new(config: Config, database: Database) -> Arc<Self> {
        Arc::new(Self {
            config,
            database: Arc::new(Mutex::new(database)),
        })
    }
}

pub fn build_router(state: Arc<AppState>) -> Result<Router> {
    let cors = cors_layer(&state.config)?;

    let app = Router::new()
        .route("/health", get(routes::health_check))
        // Identity-provider callbacks
        .route("/api/auth/signin", post(routes::auth::sign_in))
        .route("/api/auth/session", post(routes::auth::session))
        .route("/api/users", get(routes::users::list_users))
        .route("/api/fingerprint", post(routes::fingerprint::create_fingerprint))
        .route("/api/fingerprint/:user_id", get(routes::fingerprint::get_fingerprint))
        .route("/api/offence", post(routes::offence::create_offence))
        .route("/api/offence/:user_id", get(routes::offence::get_offences))
        .route("/api/eligibility/:user_id", get(routes::eligibility::check))
        .route("/api/clearance", post(routes::clearance::create_clearance))
        .route("/api/clearence", post(routes::clearance::create_clearance))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn cors_layer(config: &Config) -> Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.server.allowed_origins.is_empty() {
        return Ok(layer.allow_origin(Any));
    }

    let origins = config
        .server
        .allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|e| AppError::Config(format!("Invalid origin {}: {}", origin, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(layer.allow_origin(origins))
}

pub async fn serve(config: Config) -> Result<()> {
    let database = Database::new(&config.database.path)?;
    info!("Opened database at {}", config.database.path);

    let address = config.bind_address();
    let state = AppState::new(config, database);
    let app = build_router(state)?;

    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", address, e))?;
    info!("Listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::warn!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_rejects_invalid_origin() {
        let mut config = Config::default();
        config.server.allowed_origins = vec!["http://bad\norigin".to_string()];

        let err = cors_layer(&config).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_router_builds_with_origins() {
        let mut config = Config::default();
        config.server.allowed_origins = vec!["https://clearance.example".to_string()];

        let state = AppState::new(config, Database::in_memory().unwrap());
        assert!(build_router(state).is_ok());
    }
}
