//! Session middleware resolution and built-in stores.
//!
//! # Data Flow
//! ```text
//! sessionMiddleware(name, factory) calls (startup only)
//!     → resolver.rs (named registry of one-shot async factories)
//!
//! Commit, step 2:
//!     configured store name
//!     → resolve: empty = disabled, match = await factory, else warn
//!     → resulting Entry applied ahead of middleware/routes
//! ```
//!
//! # Design Decisions
//! - Factories are FnOnce and drained on resolve, so a double resolve is
//!   unrepresentable
//! - A name mismatch is a configuration warning, not a startup failure:
//!   non-session routes must still serve
//! - Store persistence stays minimal: one JSON blob per session
//! - Flash messages are plain buckets inside that blob, drained on read

pub mod flash;
pub mod resolver;
pub mod store;

pub use resolver::{SessionFactory, SessionRegistry};
pub use store::{
    file_store_factory, memory_store_factory, Session, FILE_STORE_NAME, MEMORY_STORE_NAME,
};
