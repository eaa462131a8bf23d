//! Static file stages backed by tower-http's `ServeDir`.
//!
//! # Responsibilities
//! - Build a USE-style stage handler serving a directory under a prefix
//! - Strip the mount prefix before handing the path to `ServeDir`
//! - Fall through to the rest of the chain on miss (express semantics)
//!
//! The actual byte serving (ranges, content types, precompressed variants)
//! is `ServeDir`'s job; this module only adapts it to the chain.

use std::path::PathBuf;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, Uri};
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::chain::stage::{handler, ChainRequest, Next, StageResult, StageHandler};

/// Stage handler serving files from `dir` for paths under `prefix`.
pub fn static_handler(prefix: &str, dir: impl Into<PathBuf>) -> StageHandler {
    let prefix = prefix.trim_end_matches('/').to_string();
    let dir: PathBuf = dir.into();
    handler(move |req: ChainRequest, next: Next| {
        serve(prefix.clone(), dir.clone(), req, next)
    })
}

async fn serve(prefix: String, dir: PathBuf, req: ChainRequest, next: Next) -> StageResult {
    // Only reads are served from disk; everything else stays on the chain.
    if req.method() != Method::GET && req.method() != Method::HEAD {
        return next.run(req).await;
    }

    let path = req.uri().path();
    let rel = match path.strip_prefix(prefix.as_str()) {
        Some(rest) if rest.is_empty() => "/",
        Some(rest) => rest,
        None => path,
    };
    let uri = Uri::try_from(rel)?;

    let serve_req = Request::builder()
        .method(req.method().clone())
        .uri(uri)
        .body(Body::empty())?;

    let resp = match ServeDir::new(&dir).oneshot(serve_req).await {
        Ok(resp) => resp,
        Err(never) => match never {},
    };

    // Miss: hand the original request back to the chain.
    if resp.status() == StatusCode::NOT_FOUND {
        return next.run(req).await;
    }
    Ok(resp.map(Body::new))
}
