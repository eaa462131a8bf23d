//! The commit engine: ordering policy and the one-shot launch transition.
//!
//! # Data Flow
//! ```text
//! route()/middleware()/static_route()/session_middleware() calls
//!     → buffered in the accumulator / session registry
//!
//! before-launch hook → commit():
//!     statics (call order)            [unless static_routes_in_session]
//!     session (resolved by name, awaited — strict barrier)
//!     statics (call order)            [when static_routes_in_session]
//!     middleware (call order)
//!     routes (REVERSE call order — last registered wins ties)
//!     phase = Committed
//!
//! after commit: add* calls buffer AND apply immediately
//! ```
//!
//! # Design Decisions
//! - Explicit Idle/Committing/Committed state machine; the transition fires
//!   exactly once and is never retried
//! - Route reversal iterates an immutable snapshot back-to-front; the stored
//!   buffer keeps call order
//! - Any chain rejection aborts startup: a partially wired server must not
//!   come up

use std::path::PathBuf;
use std::sync::Arc;

use crate::chain::stage::StageHandler;
use crate::chain::static_files::static_handler;
use crate::chain::DispatchChain;
use crate::config::schema::RouterConfig;
use crate::error::RouterError;
use crate::registry::accumulator::Accumulator;
use crate::registry::entry::{Entry, Verb};
use crate::session::resolver::{SessionFactory, SessionRegistry};

/// Commit state. `Committed` is the launched state: new registrations apply
/// immediately instead of waiting for a second orchestrated pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Committing,
    Committed,
}

/// The accumulator/commit-engine pair. Owns the buffers, the session
/// registry, and the commit state; the dispatch chain is only ever appended
/// to through it.
pub struct RouterEngine {
    phase: Phase,
    accumulator: Accumulator,
    sessions: SessionRegistry,
    chain: Arc<dyn DispatchChain>,
    config: RouterConfig,
}

impl RouterEngine {
    pub fn new(config: RouterConfig, chain: Arc<dyn DispatchChain>) -> Self {
        Self {
            phase: Phase::Idle,
            accumulator: Accumulator::new(),
            sessions: SessionRegistry::new(),
            chain,
            config,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Register a route. Verb defaults to GET. Before commit the entry is
    /// buffered; after commit it is also applied immediately.
    pub fn route(
        &mut self,
        verb: Option<Verb>,
        pattern: impl Into<String>,
        handler: StageHandler,
    ) -> Result<(), RouterError> {
        let entry = Entry::route(verb, pattern, handler);
        self.accumulator.push_route(entry.clone());
        self.apply_if_committed(&entry)
    }

    /// Register middleware. Verb defaults to USE; a missing pattern makes it
    /// global.
    pub fn middleware(
        &mut self,
        pattern: Option<String>,
        handler: StageHandler,
        verb: Option<Verb>,
    ) -> Result<(), RouterError> {
        let entry = Entry::middleware(pattern, handler, verb);
        self.accumulator.push_middleware(entry.clone());
        self.apply_if_committed(&entry)
    }

    /// Register a static mount serving `dir` under `prefix`. `/assets` and
    /// `/assets/` mount the same tree.
    pub fn static_route(
        &mut self,
        prefix: &str,
        dir: impl Into<PathBuf>,
    ) -> Result<(), RouterError> {
        let prefix = match prefix.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        tracing::debug!(prefix, "setting static mount");
        let entry = Entry::static_mount(prefix, static_handler(prefix, dir));
        self.accumulator.push_static(entry.clone());
        self.apply_if_committed(&entry)
    }

    /// Register a named session-middleware factory. Session state must sit
    /// ahead of every user-facing entry, so this is rejected once launched.
    pub fn session_middleware(
        &mut self,
        name: impl Into<String>,
        factory: SessionFactory,
    ) -> Result<(), RouterError> {
        if self.phase == Phase::Committed {
            return Err(RouterError::AlreadyLaunched);
        }
        self.sessions.register(name, factory);
        Ok(())
    }

    /// The route buffer in call order, regardless of commit state.
    pub fn routes(&self) -> Vec<Entry> {
        self.accumulator.routes().to_vec()
    }

    /// The underlying chain handle, for collaborators needing direct access.
    pub fn dispatch_chain(&self) -> Arc<dyn DispatchChain> {
        self.chain.clone()
    }

    /// Drain all buffers onto the dispatch chain in policy order. Fires
    /// exactly once; a second call is a no-op. Never retried on failure.
    pub async fn commit(&mut self) -> Result<(), RouterError> {
        if self.phase != Phase::Idle {
            tracing::debug!(phase = ?self.phase, "commit already performed, ignoring");
            return Ok(());
        }
        self.phase = Phase::Committing;

        if !self.config.static_routes_in_session {
            for entry in self.accumulator.statics() {
                self.apply(entry)?;
            }
        }

        // Strict barrier: nothing downstream applies until session setup
        // completes or is confirmed absent.
        let store_name = self.config.session_store_name.clone();
        if let Some(session) = self.sessions.resolve(&store_name).await? {
            self.apply(&session)?;
        }

        if self.config.static_routes_in_session {
            for entry in self.accumulator.statics() {
                self.apply(entry)?;
            }
        }

        for entry in self.accumulator.middleware() {
            self.apply(entry)?;
        }

        // Reverse call order: the chain matches in application order, so the
        // most recently registered route wins ties over earlier ones.
        for entry in self.accumulator.routes().iter().rev() {
            self.apply(entry)?;
        }

        self.phase = Phase::Committed;
        tracing::debug!(stages = self.chain.len(), "dispatch chain committed");
        Ok(())
    }

    fn apply_if_committed(&self, entry: &Entry) -> Result<(), RouterError> {
        if self.phase == Phase::Committed {
            self.apply(entry)
        } else {
            Ok(())
        }
    }

    /// Append one entry to the chain. The single decision point shared by
    /// every kind: a string pattern registers (verb, pattern, handler), an
    /// absent one registers a pattern-less (verb, handler).
    fn apply(&self, entry: &Entry) -> Result<(), RouterError> {
        match entry.pattern.as_deref() {
            Some(pattern) => {
                tracing::debug!(verb = %entry.verb, pattern, "registering route");
                self.chain.append(entry.verb, Some(pattern), entry.handler.clone())
            }
            None => {
                tracing::debug!(verb = %entry.verb, "registering middleware");
                self.chain.append(entry.verb, None, entry.handler.clone())
            }
        }
    }
}
