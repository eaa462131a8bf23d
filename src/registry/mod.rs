//! Registration buffers and the entry model.
//!
//! # Data Flow
//! ```text
//! route()/middleware()/static_route() calls
//!     → entry.rs (normalize into an immutable Entry)
//!     → accumulator.rs (append to the per-kind ordered buffer)
//!     → drained (without mutation) by the commit engine at launch
//! ```
//!
//! # Design Decisions
//! - Entries are immutable once constructed
//! - Buffers are append-only and survive commit (introspection queries)
//! - Verbs are a closed enum, not strings; unknown methods fail at parse
//! - No pattern-syntax validation here; bad patterns surface at apply time

pub mod accumulator;
pub mod entry;

pub use accumulator::Accumulator;
pub use entry::{Entry, Kind, Verb};
