//! Per-kind ordered registration buffers.
//!
//! # Responsibilities
//! - Record every registration in call order, one buffer per kind
//! - Hand the commit engine immutable views to iterate
//! - Answer introspection queries after commit
//!
//! # Design Decisions
//! - Append-only: nothing is drained, reversed, or reordered in place
//! - Route reversal happens at iteration time in the commit engine, so the
//!   stored buffer always reflects call order

use crate::registry::entry::Entry;

/// The three ordered buffers collected before commit. Session factories are
/// held separately by the session registry because they resolve by name, not
/// by position.
#[derive(Default)]
pub struct Accumulator {
    middleware: Vec<Entry>,
    statics: Vec<Entry>,
    routes: Vec<Entry>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_middleware(&mut self, entry: Entry) {
        self.middleware.push(entry);
    }

    pub fn push_static(&mut self, entry: Entry) {
        self.statics.push(entry);
    }

    pub fn push_route(&mut self, entry: Entry) {
        self.routes.push(entry);
    }

    /// Middleware entries in call order.
    pub fn middleware(&self) -> &[Entry] {
        &self.middleware
    }

    /// Static entries in call order.
    pub fn statics(&self) -> &[Entry] {
        &self.statics
    }

    /// Route entries in call order. The commit engine iterates this
    /// back-to-front; callers of the introspection API see call order.
    pub fn routes(&self) -> &[Entry] {
        &self.routes
    }
}
