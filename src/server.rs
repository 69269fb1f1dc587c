use crate::config::Config;
use crate::error::ConfigurationError;
use crate::guard::AdmissionGuard;
use crate::handlers::{health_check, hello, metrics, AppState, SharedState};
use crate::layer::SlowDownLayer;
use crate::middleware::logging_middleware;
use axum::routing::get;
use axum::{middleware, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the application router around an existing guard.
///
/// Only `/hello` is guarded; `/health` and `/metrics` never count against the
/// budget.
pub fn router(guard: AdmissionGuard) -> Router {
    let state: SharedState = Arc::new(AppState::new(guard.clone()));

    let guarded = Router::new()
        .route("/hello", get(hello))
        .route_layer(SlowDownLayer::new(guard));

    Router::new()
        .merge(guarded)
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(logging_middleware)),
        )
}

/// Build the application router from server configuration.
pub fn create_app(config: &Config) -> Result<Router, ConfigurationError> {
    let guard = config.guard_config().build()?;
    Ok(router(guard))
}

pub struct Server {
    app: Router,
    bind_addr: SocketAddr,
}

impl Server {
    pub fn new(config: Config) -> Result<Self, ConfigurationError> {
        let app = create_app(&config)?;
        tracing::info!(
            target: "slowdown::server",
            requests = config.requests,
            window_seconds = config.window_seconds,
            "Guarding /hello"
        );

        Ok(Self {
            app,
            bind_addr: config.bind_addr,
        })
    }

    pub async fn run(self) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.bind_addr).await?;

        tracing::info!(target: "slowdown::server", "Server listening on {}", listener.local_addr()?);
        tracing::info!(target: "slowdown::server", "Health check available at /health");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(target: "slowdown::server", "failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(target: "slowdown::server", "failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!(target: "slowdown::server", "Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!(target: "slowdown::server", "Received terminate signal, initiating graceful shutdown");
        },
    }
}
