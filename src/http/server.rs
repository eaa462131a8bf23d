//! HTTP server setup.
//!
//! # Responsibilities
//! - Wrap the dispatch chain in an axum app
//! - Wire the always-on collaborators (tracing, compression, body parsing,
//!   Connection: close) ahead of every chain stage
//! - Serve with graceful shutdown
//!
//! # Design Decisions
//! - The chain is the app's fallback service, so every request flows
//!   through it after the collaborator layers
//! - Collaborator layers are fixed at build time; only chain stages are
//!   appended at runtime

use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::middleware;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::compression::CompressionLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::chain::body::parse_body;
use crate::chain::{AppChain, ChainService};
use crate::config::schema::RouterConfig;

/// HTTP server serving a committed dispatch chain.
pub struct HttpServer {
    config: RouterConfig,
    chain: Arc<AppChain>,
}

impl HttpServer {
    pub fn new(config: RouterConfig, chain: Arc<AppChain>) -> Self {
        Self { config, chain }
    }

    /// Build the axum app: chain service behind the collaborator layers.
    pub fn build_app(&self) -> Router {
        let body_config = Arc::new(self.config.body_parser.clone());
        Router::new()
            .fallback_service(ChainService::new(self.chain.clone()))
            .layer(middleware::from_fn_with_state(body_config, parse_body))
            // needs to be turned off behind production load balancers
            .layer(SetResponseHeaderLayer::if_not_present(
                header::CONNECTION,
                HeaderValue::from_static("close"),
            ))
            .layer(CompressionLayer::new())
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.build_app())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
