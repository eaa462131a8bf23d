//! Binds the commit engine and HTTP server to the host's lifecycle hooks.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::chain::{AppChain, FallbackPolicy};
use crate::config::schema::RouterConfig;
use crate::engine::RouterEngine;
use crate::error::RouterError;
use crate::http::server::HttpServer;
use crate::lifecycle::hooks::{Hook, Hooks};
use crate::lifecycle::shutdown::Shutdown;

/// Wires the three lifecycle hooks to the engine and the listener:
/// before-launch commits, after-launch binds and serves, stop drains.
pub struct LifecycleCoordinator {
    engine: Arc<Mutex<RouterEngine>>,
    chain: Arc<AppChain>,
    config: RouterConfig,
    shutdown: Shutdown,
    server: Mutex<Option<JoinHandle<Result<(), std::io::Error>>>>,
}

impl LifecycleCoordinator {
    pub fn new(
        engine: Arc<Mutex<RouterEngine>>,
        chain: Arc<AppChain>,
        config: RouterConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            engine,
            chain,
            config,
            shutdown: Shutdown::new(),
            server: Mutex::new(None),
        })
    }

    /// Register the engine's callbacks on the host's hooks.
    pub fn install(self: &Arc<Self>, hooks: &Hooks) {
        let engine = self.engine.clone();
        hooks.on(Hook::BeforeLaunch, move || {
            let engine = engine.clone();
            async move { engine.lock().await.commit().await }
        });

        let coordinator = self.clone();
        hooks.on(Hook::AfterLaunch, move || {
            let coordinator = coordinator.clone();
            async move { coordinator.launch().await }
        });

        let coordinator = self.clone();
        hooks.on(Hook::Stop, move || {
            let coordinator = coordinator.clone();
            async move {
                coordinator.stop().await;
                Ok(())
            }
        });
    }

    /// Bind the listener and start serving. The terminal fallback goes in
    /// first so it covers every committed entry; it is not part of the
    /// ordered commit sequence.
    async fn launch(&self) -> Result<(), RouterError> {
        if self.config.production {
            self.chain.install_fallback(FallbackPolicy {
                error_page: self.config.error_page.clone(),
            });
        }

        let listener = TcpListener::bind(("0.0.0.0", self.config.port)).await?;
        tracing::info!(port = self.config.port, "starting app");

        let server = HttpServer::new(self.config.clone(), self.chain.clone());
        let shutdown_rx = self.shutdown.subscribe();
        let handle = tokio::spawn(async move { server.run(listener, shutdown_rx).await });
        *self.server.lock().await = Some(handle);
        Ok(())
    }

    /// Release the listener. No-op when never started.
    async fn stop(&self) {
        let handle = self.server.lock().await.take();
        if let Some(handle) = handle {
            tracing::info!(port = self.config.port, "shutting down app");
            self.shutdown.trigger();
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => tracing::error!(error = %err, "server exited with error"),
                Err(err) => tracing::error!(error = %err, "server task panicked"),
            }
        }
    }
}
