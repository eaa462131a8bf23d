//! Registration engine host binary.
//!
//! Loads configuration, wires the engine to its lifecycle hooks, registers
//! the built-in session stores, and drives the hooks: before-launch
//! (commit), after-launch (bind and serve), then stop on ctrl-c.
//!
//! Applications embed the library instead and register their routes on the
//! engine handle before emitting the launch hooks.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use staged_router::chain::AppChain;
use staged_router::config::load_config_or_default;
use staged_router::engine::RouterEngine;
use staged_router::lifecycle::{Hook, Hooks, LifecycleCoordinator};
use staged_router::session::{
    file_store_factory, memory_store_factory, FILE_STORE_NAME, MEMORY_STORE_NAME,
};

#[derive(Parser, Debug)]
#[command(name = "staged-router", version)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "staged_router=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = load_config_or_default(args.config.as_deref())?;

    tracing::info!(
        port = config.port,
        production = config.production,
        session_store = %config.session_store_name,
        static_routes_in_session = config.static_routes_in_session,
        "configuration loaded"
    );

    let chain = Arc::new(AppChain::new());
    let engine = Arc::new(Mutex::new(RouterEngine::new(
        config.clone(),
        chain.clone(),
    )));

    {
        let mut engine = engine.lock().await;
        engine.session_middleware(
            FILE_STORE_NAME,
            file_store_factory(config.session.clone()),
        )?;
        engine.session_middleware(
            MEMORY_STORE_NAME,
            memory_store_factory(config.session.clone()),
        )?;
    }

    let hooks = Hooks::new();
    let coordinator = LifecycleCoordinator::new(engine, chain, config);
    coordinator.install(&hooks);

    hooks.emit(Hook::BeforeLaunch).await?;
    hooks.emit(Hook::AfterLaunch).await?;

    tokio::signal::ctrl_c().await?;
    hooks.emit(Hook::Stop).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
