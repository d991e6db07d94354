//! Gateway server

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use super::router::{AppState, create_router};
use crate::config::Config;
use crate::{Error, Result};

/// CardHub Gateway server
pub struct Gateway {
    /// Configuration
    config: Arc<Config>,
}

impl Gateway {
    /// Create a new gateway
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Run the gateway
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::new(
            self.config
                .server
                .host
                .parse()
                .map_err(|e| Error::Config(format!("Invalid host: {e}")))?,
            self.config.server.port,
        );

        let http_client = reqwest::Client::builder()
            .timeout(self.config.http.timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {e}")))?;

        let state = Arc::new(AppState {
            config: Arc::clone(&self.config),
            http_client,
        });

        let app = create_router(state);

        let listener = TcpListener::bind(addr).await?;

        info!("============================================================");
        info!("CARDHUB GATEWAY v{}", env!("CARGO_PKG_VERSION"));
        info!("============================================================");
        info!(host = %self.config.server.host, port = %self.config.server.port, "Listening");

        if self.config.google.is_configured() {
            info!("GOOGLE OAUTH enabled:");
            info!("  GET /api/auth/google/begin     (consent redirect)");
            info!("  GET /api/auth/google/callback  (code exchange + profile check)");
        } else {
            warn!("GOOGLE OAUTH disabled - set GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET");
        }

        if self.config.offers.is_configured() {
            info!(model = %self.config.offers.model, "OFFER SYNTHESIS enabled:");
            info!("  POST /api/offers/fetch");
        } else {
            warn!("OFFER SYNTHESIS disabled - set ANTHROPIC_API_KEY");
        }
        info!("============================================================");

        // Run server with graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Internal(e.to_string()))?;

        Ok(())
    }
}

/// Shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
