//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! before-launch hook → commit engine transition (one-shot)
//! after-launch hook  → install terminal fallback (production),
//!                      bind listener, start serving
//! stop hook          → trigger shutdown, drain, release the listener
//! ```
//!
//! # Design Decisions
//! - Hooks are an injected capability, never a process-global
//! - Each hook fires at most once per process; the engine guards its own
//!   idempotency anyway
//! - Stop is idempotent: a no-op when the listener never started

pub mod coordinator;
pub mod hooks;
pub mod shutdown;

pub use coordinator::LifecycleCoordinator;
pub use hooks::{Hook, Hooks};
pub use shutdown::Shutdown;
