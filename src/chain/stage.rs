//! Stage and handler types for the dispatch chain.
//!
//! # Responsibilities
//! - Define the type-erased handler signature (request + continuation)
//! - Match stages against requests (mount vs exact semantics)
//! - Walk the stage snapshot via `Next`
//!
//! # Design Decisions
//! - Handlers receive a `Next` continuation: middleware delegates onward,
//!   routes usually respond without calling it
//! - USE patterns are mount prefixes (`/api` covers `/api` and `/api/...`),
//!   route verbs match the path exactly
//! - A handler error short-circuits the walk; the service layer routes it to
//!   the terminal fallback

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;

use crate::registry::entry::Verb;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// The request type stages see: whole-body axum requests.
pub type ChainRequest = Request<Body>;

/// A stage either responds or fails; failures are per-request, never fatal
/// to the listener.
pub type StageResult = Result<Response, BoxError>;

/// Type-erased stage handler.
pub type StageHandler = Arc<dyn Fn(ChainRequest, Next) -> BoxFuture<StageResult> + Send + Sync>;

/// Wrap an async closure into a [`StageHandler`].
pub fn handler<F, Fut>(f: F) -> StageHandler
where
    F: Fn(ChainRequest, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = StageResult> + Send + 'static,
{
    Arc::new(move |req, next| -> BoxFuture<StageResult> { Box::pin(f(req, next)) })
}

/// Handler that answers 200 with an empty body. Placeholder for wiring and
/// tests.
pub fn noop_handler() -> StageHandler {
    handler(|_req, _next| async { Ok(plain_response(StatusCode::OK, "")) })
}

/// Build a plain-text response with the given status.
pub fn plain_response(status: StatusCode, body: impl Into<String>) -> Response {
    let mut resp = Response::new(Body::from(body.into()));
    *resp.status_mut() = status;
    resp
}

/// One applied chain stage.
#[derive(Clone)]
pub struct Stage {
    pub verb: Verb,
    pub pattern: Option<String>,
    pub handler: StageHandler,
}

impl Stage {
    /// Whether this stage handles the request. No pattern means every path.
    pub fn matches(&self, req: &ChainRequest) -> bool {
        if !self.verb.matches(req.method()) {
            return false;
        }
        match &self.pattern {
            None => true,
            Some(pattern) => match self.verb {
                Verb::Use => mount_matches(pattern, req.uri().path()),
                _ => req.uri().path() == pattern,
            },
        }
    }
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("verb", &self.verb)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

/// Mount-style prefix match: `/api` covers `/api` and `/api/...` but not
/// `/apix`. `/` covers everything.
fn mount_matches(prefix: &str, path: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Continuation over the remaining stages of a snapshot.
///
/// The snapshot is immutable; stages appended after this request started are
/// invisible to it.
#[derive(Clone)]
pub struct Next {
    stages: Arc<Vec<Stage>>,
    pos: usize,
}

impl Next {
    pub(crate) fn new(stages: Arc<Vec<Stage>>) -> Self {
        Self { stages, pos: 0 }
    }

    /// Run the next matching stage, or answer 404 when none remains.
    pub fn run(mut self, req: ChainRequest) -> BoxFuture<StageResult> {
        Box::pin(async move {
            loop {
                if self.pos >= self.stages.len() {
                    return Ok(plain_response(StatusCode::NOT_FOUND, "Not Found"));
                }
                let idx = self.pos;
                self.pos += 1;
                if self.stages[idx].matches(&req) {
                    let stage_handler = self.stages[idx].handler.clone();
                    return stage_handler(req, self).await;
                }
            }
        })
    }
}
