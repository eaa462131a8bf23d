//! The entry model: one registrable unit.
//!
//! # Responsibilities
//! - Normalize registration requests into immutable `Entry` records
//! - Apply per-kind verb defaults (GET for routes, USE for middleware/static)
//! - Case-fold method names into the closed `Verb` enum
//!
//! # Design Decisions
//! - Verbs are a finite tagged variant mapped through explicit match arms,
//!   never a string keyed into the chain at runtime
//! - Optional arguments are named `Option` fields, not positional
//!   reinterpretation of a shorter argument list

use std::fmt;
use std::str::FromStr;

use axum::http::Method;

use crate::chain::stage::StageHandler;

/// HTTP verbs the dispatch chain supports, plus `Use` for pattern-less or
/// mount-style middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
    Use,
}

impl Verb {
    /// Lowercase canonical name, matching the chain's registration table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "get",
            Verb::Post => "post",
            Verb::Put => "put",
            Verb::Delete => "delete",
            Verb::Use => "use",
        }
    }

    /// Whether a request method is handled by this verb. `Use` stages see
    /// every request.
    pub fn matches(&self, method: &Method) -> bool {
        match self {
            Verb::Get => method == Method::GET,
            Verb::Post => method == Method::POST,
            Verb::Put => method == Method::PUT,
            Verb::Delete => method == Method::DELETE,
            Verb::Use => true,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = UnknownVerb;

    /// Method names are case-folded before matching.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Verb::Get),
            "post" => Ok(Verb::Post),
            "put" => Ok(Verb::Put),
            "delete" => Ok(Verb::Delete),
            "use" => Ok(Verb::Use),
            _ => Err(UnknownVerb(s.to_string())),
        }
    }
}

/// Parse error for an unsupported method name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVerb(pub String);

impl fmt::Display for UnknownVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported method name '{}'", self.0)
    }
}

impl std::error::Error for UnknownVerb {}

/// The class of a registrable unit. Drives buffering and commit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Middleware,
    Static,
    Route,
    Session,
}

/// One buffered registration unit. Immutable once created.
///
/// `pattern == None` means the handler covers every path (pure middleware).
#[derive(Clone)]
pub struct Entry {
    pub kind: Kind,
    pub verb: Verb,
    pub pattern: Option<String>,
    pub handler: StageHandler,
    pub name: Option<String>,
}

impl Entry {
    /// A route entry. Verb defaults to GET when omitted.
    pub fn route(verb: Option<Verb>, pattern: impl Into<String>, handler: StageHandler) -> Self {
        Self {
            kind: Kind::Route,
            verb: verb.unwrap_or(Verb::Get),
            pattern: Some(pattern.into()),
            handler,
            name: None,
        }
    }

    /// A middleware entry. Verb defaults to USE when omitted; a missing
    /// pattern makes it global.
    pub fn middleware(pattern: Option<String>, handler: StageHandler, verb: Option<Verb>) -> Self {
        Self {
            kind: Kind::Middleware,
            verb: verb.unwrap_or(Verb::Use),
            pattern,
            handler,
            name: None,
        }
    }

    /// A static mount entry: USE with a prefix pattern.
    pub fn static_mount(prefix: impl Into<String>, handler: StageHandler) -> Self {
        Self {
            kind: Kind::Static,
            verb: Verb::Use,
            pattern: Some(prefix.into()),
            handler,
            name: None,
        }
    }

    /// A resolved session middleware entry, tagged with the store name that
    /// produced it.
    pub fn session(handler: StageHandler, name: impl Into<String>) -> Self {
        Self {
            kind: Kind::Session,
            verb: Verb::Use,
            pattern: None,
            handler,
            name: Some(name.into()),
        }
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("kind", &self.kind)
            .field("verb", &self.verb)
            .field("pattern", &self.pattern)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
