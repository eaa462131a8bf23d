//! Named registry of deferred session-middleware factories.

use std::collections::HashMap;

use crate::chain::stage::{BoxFuture, StageHandler};
use crate::error::RouterError;
use crate::registry::entry::Entry;

/// One-shot asynchronous producer of a session-middleware handler. Setup may
/// suspend (opening a backing store); the commit engine awaits it before
/// applying anything downstream of the session stage.
pub type SessionFactory =
    Box<dyn FnOnce() -> BoxFuture<Result<StageHandler, RouterError>> + Send>;

/// Store-name → factory mapping. At most one factory is activated per
/// process: the one matching the configured store name.
#[derive(Default)]
pub struct SessionRegistry {
    factories: HashMap<String, SessionFactory>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, factory: SessionFactory) {
        let name = name.into();
        tracing::debug!(store = %name, "registered session middleware factory");
        self.factories.insert(name, factory);
    }

    /// Registered store names, for diagnostics.
    pub fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Resolve the configured store name into a session entry.
    ///
    /// An empty name disables sessions. An unknown name logs a warning
    /// listing the registered stores and disables sessions; the server still
    /// comes up. A matching factory is removed, invoked, and awaited; its
    /// setup failure is fatal.
    pub async fn resolve(&mut self, configured: &str) -> Result<Option<Entry>, RouterError> {
        if configured.is_empty() {
            tracing::debug!("no session store configured, sessions disabled");
            return Ok(None);
        }
        match self.factories.remove(configured) {
            Some(factory) => {
                let session_handler = factory().await?;
                tracing::debug!(store = %configured, "session middleware resolved");
                Ok(Some(Entry::session(session_handler, configured)))
            }
            None => {
                tracing::warn!(
                    configured = %configured,
                    registered = ?self.names(),
                    "configured session store is not registered, sessions disabled"
                );
                Ok(None)
            }
        }
    }
}
