//! Crate-wide error types.

use thiserror::Error;

use crate::registry::entry::Verb;

/// Errors raised by the registration engine and lifecycle coordinator.
///
/// Structural errors (registration failures, session setup failures) are
/// fatal at startup: the server must not come up partially wired. Per-request
/// handler errors never appear here; they are isolated by the dispatch
/// chain's terminal fallback.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Session middleware registered after commit. Session state must sit
    /// ahead of every user-facing entry, so a post-launch registration can
    /// never be ordered correctly and is rejected outright.
    #[error("session middleware cannot be registered after launch")]
    AlreadyLaunched,

    /// The dispatch chain rejected an entry.
    #[error("dispatch chain rejected {verb} {pattern:?}: {reason}")]
    Registration {
        verb: Verb,
        pattern: Option<String>,
        reason: String,
    },

    /// A session-store factory failed during its asynchronous setup.
    #[error("session store '{name}' failed to initialize: {source}")]
    SessionInit {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Listener bind or other I/O failure during launch.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
