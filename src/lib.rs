//! Deferred, ordered HTTP route/middleware registration engine.
//!
//! Registrations made during an application's startup phase are buffered
//! per kind and committed onto a live dispatch chain at one well-defined
//! transition point (launch), enforcing ordering invariants plain
//! chronological registration cannot: session middleware ahead of
//! application routes, statics inside or outside the session boundary,
//! and last-registered routes winning ties.

pub mod chain;
pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod registry;
pub mod session;

pub use chain::stage::{handler, plain_response, StageHandler, StageResult};
pub use chain::{AppChain, DispatchChain};
pub use config::{load_config, load_config_or_default, RouterConfig};
pub use engine::{Phase, RouterEngine};
pub use error::RouterError;
pub use http::HttpServer;
pub use lifecycle::{Hook, Hooks, LifecycleCoordinator, Shutdown};
pub use registry::{Entry, Kind, Verb};
pub use session::{Session, SessionRegistry};
