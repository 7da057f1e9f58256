//! Gatekeeper Web Server
//!
//! Binds the listener and serves the gated router.

use crate::{create_app, AppState, WebError, WebResult};
use axum::serve;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Main gatekeeper web server
pub struct GatekeeperServer {
    state: AppState,
}

impl GatekeeperServer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Bind the configured address and serve until the listener fails
    pub async fn start(self) -> WebResult<()> {
        let address = self.state.config.address();

        info!("🚀 Starting Gatekeeper Web Server");
        info!("📍 Server address: http://{}", address);

        let listener = TcpListener::bind(&address)
            .await
            .map_err(WebError::Server)?;

        self.serve(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve(self, listener: TcpListener) -> WebResult<()> {
        let app = create_app(self.state);

        if let Ok(local) = listener.local_addr() {
            info!("✅ Server listening on http://{}", local);
        }

        if let Err(e) = serve(listener, app).await {
            error!("❌ Server error: {}", e);
            return Err(WebError::Server(e));
        }

        Ok(())
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}
