//! Hook points the engine consumes from its host.
//!
//! A small event-emitter capability handed to the coordinator at
//! construction. The host (binary, test harness, embedding application)
//! owns when each hook fires.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use crate::chain::stage::BoxFuture;
use crate::error::RouterError;

/// The three lifecycle signals the engine binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    /// Fires once, synchronously before the listener binds.
    BeforeLaunch,
    /// Fires once, after the listener is confirmed bound.
    AfterLaunch,
    /// Releases the listener.
    Stop,
}

type HookFn = Arc<dyn Fn() -> BoxFuture<Result<(), RouterError>> + Send + Sync>;

/// Registry of hook callbacks.
#[derive(Default)]
pub struct Hooks {
    handlers: Mutex<HashMap<Hook, Vec<HookFn>>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for a hook.
    pub fn on<F, Fut>(&self, hook: Hook, callback: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), RouterError>> + Send + 'static,
    {
        let callback: HookFn = Arc::new(move || {
            let fut: BoxFuture<Result<(), RouterError>> = Box::pin(callback());
            fut
        });
        self.handlers
            .lock()
            .expect("hooks lock poisoned")
            .entry(hook)
            .or_default()
            .push(callback);
    }

    /// Fire a hook, running its callbacks in registration order. The first
    /// failure aborts: lifecycle errors are fatal to startup.
    pub async fn emit(&self, hook: Hook) -> Result<(), RouterError> {
        let callbacks: Vec<HookFn> = self
            .handlers
            .lock()
            .expect("hooks lock poisoned")
            .get(&hook)
            .cloned()
            .unwrap_or_default();
        tracing::debug!(?hook, callbacks = callbacks.len(), "emitting lifecycle hook");
        for callback in callbacks {
            callback().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn callbacks_run_in_registration_order() {
        let hooks = Hooks::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second"] {
            let order = order.clone();
            hooks.on(Hook::BeforeLaunch, move || {
                let order = order.clone();
                async move {
                    order.lock().unwrap().push(tag);
                    Ok(())
                }
            });
        }

        hooks.emit(Hook::BeforeLaunch).await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn unbound_hooks_are_noops() {
        let hooks = Hooks::new();
        assert!(hooks.emit(Hook::Stop).await.is_ok());
    }

    #[tokio::test]
    async fn emit_runs_callbacks_every_time() {
        let hooks = Hooks::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        hooks.on(Hook::AfterLaunch, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        hooks.emit(Hook::AfterLaunch).await.unwrap();
        hooks.emit(Hook::AfterLaunch).await.unwrap();
        // One-shot semantics live in the callbacks themselves (the commit
        // engine's phase guard), not in the emitter.
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
