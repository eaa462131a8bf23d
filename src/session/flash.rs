//! One-shot flash messages carried inside the session.
//!
//! Messages are queued under a kind ("notice", "error", ...) on one request
//! and drained on a later one; taking a bucket empties it, so each message
//! renders exactly once. The bag rides in the session values map and
//! persists through whichever store backs the session.

use serde_json::Value;

use crate::session::store::Session;

/// Reserved session key holding the flash buckets.
const FLASH_KEY: &str = "_flash";

impl Session {
    /// Queue a flash message under a kind.
    pub fn add_flash(&self, kind: &str, message: impl Into<String>) {
        let mut bag = match self.get(FLASH_KEY) {
            Some(Value::Object(map)) => map,
            // Missing or malformed bag: start over.
            _ => serde_json::Map::new(),
        };
        match bag.get_mut(kind) {
            Some(Value::Array(bucket)) => bucket.push(Value::String(message.into())),
            _ => {
                bag.insert(
                    kind.to_string(),
                    Value::Array(vec![Value::String(message.into())]),
                );
            }
        }
        self.insert(FLASH_KEY, Value::Object(bag));
    }

    /// Drain the messages queued under a kind. Empty when nothing was
    /// queued or an earlier request already took them.
    pub fn take_flash(&self, kind: &str) -> Vec<String> {
        let mut bag = match self.get(FLASH_KEY) {
            Some(Value::Object(map)) => map,
            _ => return Vec::new(),
        };
        let messages = match bag.remove(kind) {
            Some(Value::Array(bucket)) => bucket
                .into_iter()
                .filter_map(|value| match value {
                    Value::String(message) => Some(message),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        self.insert(FLASH_KEY, Value::Object(bag));
        messages
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{header, Request};
    use axum::http::StatusCode;

    use crate::chain::stage::{handler, plain_response, Next, Stage};
    use crate::config::schema::SessionConfig;
    use crate::registry::entry::Verb;
    use crate::session::store::{session_middleware, MemoryStore, Session};

    fn stages() -> Arc<Vec<Stage>> {
        let store = Arc::new(MemoryStore::new(Duration::from_secs(3600)));
        Arc::new(vec![
            Stage {
                verb: Verb::Use,
                pattern: None,
                handler: session_middleware(store, SessionConfig::default()),
            },
            Stage {
                verb: Verb::Get,
                pattern: Some("/push".into()),
                handler: handler(|req, _next| async move {
                    let session = req
                        .extensions()
                        .get::<Session>()
                        .cloned()
                        .ok_or("session extension missing")?;
                    session.add_flash("notice", "profile saved");
                    session.add_flash("notice", "email sent");
                    Ok(plain_response(StatusCode::OK, "queued"))
                }),
            },
            Stage {
                verb: Verb::Get,
                pattern: Some("/pop".into()),
                handler: handler(|req, _next| async move {
                    let session = req
                        .extensions()
                        .get::<Session>()
                        .cloned()
                        .ok_or("session extension missing")?;
                    Ok(plain_response(
                        StatusCode::OK,
                        session.take_flash("notice").join(","),
                    ))
                }),
            },
        ])
    }

    async fn body_of(
        stages: Arc<Vec<Stage>>,
        path: &str,
        cookie: Option<&str>,
    ) -> (String, Option<String>) {
        let mut builder = Request::builder().uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let resp = Next::new(stages)
            .run(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let set_cookie = resp
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
        (String::from_utf8(bytes.to_vec()).unwrap(), set_cookie)
    }

    #[tokio::test]
    async fn flash_messages_drain_on_first_read() {
        let stages = stages();
        let (_, cookie) = body_of(stages.clone(), "/push", None).await;
        let cookie = cookie.expect("fresh session sets a cookie");

        let (first, _) = body_of(stages.clone(), "/pop", Some(&cookie)).await;
        assert_eq!(first, "profile saved,email sent");

        // Taken once: a second read finds the bucket empty.
        let (second, _) = body_of(stages, "/pop", Some(&cookie)).await;
        assert_eq!(second, "");
    }

    #[tokio::test]
    async fn taking_an_unused_kind_is_empty() {
        let stages = stages();
        let (body, _) = body_of(stages, "/pop", None).await;
        assert_eq!(body, "");
    }
}
