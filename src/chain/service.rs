//! Tower service dispatching requests through the chain.
//!
//! # Responsibilities
//! - Snapshot the stage vector once per request
//! - Run the stage walk and convert handler errors into responses
//! - Apply the terminal fallback (production) or render the error (dev)

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::Response;
use tower::Service;

use crate::chain::stage::{plain_response, BoxError, BoxFuture, ChainRequest, Next};
use crate::chain::{AppChain, FallbackPolicy, RequestUser};

/// Request dispatcher over an [`AppChain`]. Installed as the axum app's
/// fallback service so every request flows through the chain.
#[derive(Clone)]
pub struct ChainService {
    chain: Arc<AppChain>,
}

impl ChainService {
    pub fn new(chain: Arc<AppChain>) -> Self {
        Self { chain }
    }
}

impl Service<ChainRequest> for ChainService {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ChainRequest) -> Self::Future {
        let stages = self.chain.snapshot();
        let fallback = self.chain.fallback();
        Box::pin(async move {
            let method = req.method().clone();
            let path = req.uri().path().to_string();
            let user = req.extensions().get::<RequestUser>().cloned();
            match Next::new(stages).run(req).await {
                Ok(resp) => Ok(resp),
                Err(err) => Ok(handle_error(err, fallback, method, path, user)),
            }
        })
    }
}

/// Terminal fallback for in-flight handler errors. Errors are isolated to
/// the request; the listener keeps serving.
fn handle_error(
    err: BoxError,
    fallback: Option<Arc<FallbackPolicy>>,
    method: Method,
    path: String,
    user: Option<RequestUser>,
) -> Response {
    match fallback {
        Some(policy) => {
            tracing::error!(
                method = %method,
                path = %path,
                user = user.as_ref().map(|u| u.0.as_str()).unwrap_or("anonymous"),
                error = %err,
                chain = %error_chain(&err),
                "HTTP 500 error serving request"
            );
            let mut resp = plain_response(StatusCode::INTERNAL_SERVER_ERROR, "");
            if let Ok(location) = HeaderValue::from_str(&policy.error_page) {
                resp.headers_mut().insert(header::LOCATION, location);
            }
            resp
        }
        // Outside production the error is passed through unmodified for
        // visibility.
        None => plain_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{}\n{}", err, error_chain(&err)),
        ),
    }
}

fn error_chain(err: &BoxError) -> String {
    let mut out = String::new();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str("caused by: ");
        out.push_str(&cause.to_string());
        out.push('\n');
        source = cause.source();
    }
    out
}
