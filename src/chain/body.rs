//! Body-parsing collaborator.
//!
//! # Responsibilities
//! - Buffer and decode request bodies before any chain stage runs
//! - Divert configured exact paths to raw-byte parsing
//! - Enforce per-decoder size limits
//!
//! # Design Decisions
//! - Installed as an axum layer around the chain service, so it always runs
//!   ahead of every committed entry
//! - Decoded bodies land in request extensions; the buffered bytes are put
//!   back on the request so downstream code can still read them
//! - Unknown content types pass through untouched

use std::sync::Arc;

use axum::body::{to_bytes, Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{header, Method, StatusCode};
use axum::middleware::Next;
use axum::response::Response;

use crate::chain::stage::plain_response;
use crate::config::schema::BodyParserConfig;

/// A decoded request body, keyed by the decoder that produced it.
#[derive(Debug, Clone)]
pub enum ParsedBody {
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
    Raw(Bytes),
}

/// Layer function decoding request bodies per configuration.
pub async fn parse_body(
    State(config): State<Arc<BodyParserConfig>>,
    req: Request,
    next: Next,
) -> Response {
    if !has_body(req.method()) {
        return next.run(req).await;
    }

    let (mut parts, body) = req.into_parts();
    let path = parts.uri.path().to_string();

    // Exact-path raw routes bypass content-type dispatch entirely.
    if config.raw_routes.iter().any(|r| r == &path) {
        let bytes = match to_bytes(body, config.raw_limit_bytes).await {
            Ok(bytes) => bytes,
            Err(_) => return too_large(),
        };
        parts.extensions.insert(ParsedBody::Raw(bytes.clone()));
        return next.run(Request::from_parts(parts, Body::from(bytes))).await;
    }

    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if content_type.starts_with("application/json") {
        let bytes = match to_bytes(body, config.json_limit_bytes).await {
            Ok(bytes) => bytes,
            Err(_) => return too_large(),
        };
        if !bytes.is_empty() {
            match serde_json::from_slice(&bytes) {
                Ok(value) => {
                    parts.extensions.insert(ParsedBody::Json(value));
                }
                Err(err) => {
                    return plain_response(
                        StatusCode::BAD_REQUEST,
                        format!("invalid JSON body: {err}"),
                    );
                }
            }
        }
        return next.run(Request::from_parts(parts, Body::from(bytes))).await;
    }

    if content_type.starts_with("application/x-www-form-urlencoded") {
        let bytes = match to_bytes(body, config.urlencoded_limit_bytes).await {
            Ok(bytes) => bytes,
            Err(_) => return too_large(),
        };
        let pairs: Vec<(String, String)> =
            url::form_urlencoded::parse(&bytes).into_owned().collect();
        parts.extensions.insert(ParsedBody::Form(pairs));
        return next.run(Request::from_parts(parts, Body::from(bytes))).await;
    }

    next.run(Request::from_parts(parts, body)).await
}

fn has_body(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

fn too_large() -> Response {
    plain_response(StatusCode::PAYLOAD_TOO_LARGE, "request body too large")
}
