//! The dispatch chain: the ordered list of request-handling stages.
//!
//! # Data Flow
//! ```text
//! Commit engine
//!     → DispatchChain::append (verb, optional pattern, handler)
//!     → AppChain (arc-swapped stage vector, append-only)
//!
//! Incoming request
//!     → service.rs (snapshot the stage vector)
//!     → stage.rs (walk stages in order; Use = mount match, verbs = exact)
//!     → first matching stage handles, may delegate onward via Next
//!     → no match: 404 / handler error: terminal fallback
//! ```
//!
//! # Design Decisions
//! - Append-only for the process lifetime; stages are never removed
//! - Requests dispatch against an immutable snapshot, so late appends are
//!   race-free and visible to the next request
//! - The terminal fallback is a separate slot, not an ordered stage
//! - Walk order is application order: whoever was appended first wins ties

pub mod body;
pub mod service;
pub mod stage;
pub mod static_files;

use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};

use crate::error::RouterError;
use crate::registry::entry::Verb;
use stage::{Stage, StageHandler};

pub use service::ChainService;

/// The interface the commit engine needs from the underlying HTTP chain.
/// Appending is the only mutation; `pattern == None` registers a handler
/// covering every path.
pub trait DispatchChain: Send + Sync {
    fn append(
        &self,
        verb: Verb,
        pattern: Option<&str>,
        handler: StageHandler,
    ) -> Result<(), RouterError>;

    /// Number of stages applied so far.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sanitized user context for error logging. Authentication middleware may
/// insert this as a request extension; the terminal fallback reads it.
#[derive(Debug, Clone)]
pub struct RequestUser(pub String);

/// Production fallback behavior: log the failure and send the client to a
/// fixed error page.
#[derive(Debug, Clone)]
pub struct FallbackPolicy {
    pub error_page: String,
}

/// The live chain backing the HTTP server.
pub struct AppChain {
    stages: ArcSwap<Vec<Stage>>,
    fallback: ArcSwapOption<FallbackPolicy>,
}

impl AppChain {
    pub fn new() -> Self {
        Self {
            stages: ArcSwap::from_pointee(Vec::new()),
            fallback: ArcSwapOption::empty(),
        }
    }

    /// Immutable view of the current stages, in application order.
    pub fn snapshot(&self) -> Arc<Vec<Stage>> {
        self.stages.load_full()
    }

    /// Install the production terminal fallback. Called once, after commit;
    /// never part of the ordered stage sequence.
    pub fn install_fallback(&self, policy: FallbackPolicy) {
        self.fallback.store(Some(Arc::new(policy)));
    }

    pub(crate) fn fallback(&self) -> Option<Arc<FallbackPolicy>> {
        self.fallback.load_full()
    }
}

impl Default for AppChain {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchChain for AppChain {
    fn append(
        &self,
        verb: Verb,
        pattern: Option<&str>,
        handler: StageHandler,
    ) -> Result<(), RouterError> {
        let stage = Stage {
            verb,
            pattern: pattern.map(str::to_string),
            handler,
        };
        self.stages.rcu(|current| {
            let mut next = Vec::clone(current);
            next.push(stage.clone());
            next
        });
        Ok(())
    }

    fn len(&self) -> usize {
        self.stages.load().len()
    }
}
