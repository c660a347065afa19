use crate::config::ServerConfig;
use crate::roster::{Roster, RosterHandle};
use crate::signaling::ws_handler;
use axum::Router;
use axum::routing::get;
use meshcall_core::utils::SIGNALING_PATH;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::path::Path;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Signaling WebSocket at `/ws`; everything else is served from `static_dir`.
pub fn router(roster: RosterHandle, static_dir: impl AsRef<Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(SIGNALING_PATH, get(ws_handler))
        .fallback_service(ServeDir::new(static_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(roster)
}

pub struct SignalingServer {
    listener: TcpListener,
    roster: RosterHandle,
    app: Router,
}

impl SignalingServer {
    /// Bind the listener and start the roster task.
    pub async fn bind(config: &ServerConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(config.addr()).await?;
        let roster = Roster::spawn();
        let app = router(roster.clone(), &config.static_dir);

        Ok(Self {
            listener,
            roster,
            app,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn roster(&self) -> RosterHandle {
        self.roster.clone()
    }

    pub async fn serve(self) -> io::Result<()> {
        axum::serve(self.listener, self.app).await
    }

    pub async fn serve_with_shutdown<F>(self, signal: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(signal)
            .await
    }
}
