//! Shared test helpers.

#![allow(dead_code)]

use std::sync::Mutex;

use staged_router::chain::stage::{handler, plain_response, StageHandler};
use staged_router::chain::DispatchChain;
use staged_router::error::RouterError;
use staged_router::registry::entry::Verb;
use axum::http::StatusCode;

/// Dispatch-chain stand-in recording every append in order.
#[derive(Default)]
pub struct RecordingChain {
    records: Mutex<Vec<(Verb, Option<String>)>>,
    /// When set, appends fail once this many stages exist.
    pub fail_after: Option<usize>,
}

impl RecordingChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_after(n: usize) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail_after: Some(n),
        }
    }

    pub fn records(&self) -> Vec<(Verb, Option<String>)> {
        self.records.lock().unwrap().clone()
    }
}

impl DispatchChain for RecordingChain {
    fn append(
        &self,
        verb: Verb,
        pattern: Option<&str>,
        _handler: StageHandler,
    ) -> Result<(), RouterError> {
        let mut records = self.records.lock().unwrap();
        if let Some(limit) = self.fail_after {
            if records.len() >= limit {
                return Err(RouterError::Registration {
                    verb,
                    pattern: pattern.map(str::to_string),
                    reason: "chain rejected entry".to_string(),
                });
            }
        }
        records.push((verb, pattern.map(str::to_string)));
        Ok(())
    }

    fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

/// Handler answering 200 with a fixed body.
pub fn respond_with(body: &'static str) -> StageHandler {
    handler(move |_req, _next| async move { Ok(plain_response(StatusCode::OK, body)) })
}

/// Handler that always fails.
pub fn failing() -> StageHandler {
    handler(|_req, _next| async { Err("handler blew up".to_string().into()) })
}
