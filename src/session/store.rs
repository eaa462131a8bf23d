//! Built-in session stores and the cookie-based session middleware.
//!
//! # Responsibilities
//! - Load/create a session per request, keyed by a `sid`-style cookie
//! - Expose the session to handlers as a request extension
//! - Persist the session after the response and set the cookie on first use
//!
//! Two stores ship with the engine: a file-backed one (the default) and an
//! in-memory one. Both keep the persistence format trivial: a single JSON
//! object per session.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::http::{header, HeaderMap, HeaderValue};
use dashmap::DashMap;
use uuid::Uuid;

use crate::chain::stage::{handler, BoxError, BoxFuture, StageHandler};
use crate::config::schema::SessionConfig;
use crate::error::RouterError;
use crate::session::resolver::SessionFactory;

/// Default store name, matched against `session_store_name`.
pub const FILE_STORE_NAME: &str = "file-store-session";

/// In-memory store name.
pub const MEMORY_STORE_NAME: &str = "memory-store-session";

type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Backing storage for session payloads.
pub trait SessionStore: Send + Sync {
    fn load(&self, id: String) -> BoxFuture<Result<Option<JsonMap>, BoxError>>;
    fn save(&self, id: String, data: JsonMap) -> BoxFuture<Result<(), BoxError>>;
}

/// Per-request session handle, available to handlers as a request extension.
#[derive(Clone)]
pub struct Session {
    id: String,
    fresh: bool,
    values: Arc<Mutex<JsonMap>>,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether this session was created by the current request.
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.lock().get(key).cloned()
    }

    pub fn insert(&self, key: impl Into<String>, value: serde_json::Value) {
        self.lock().insert(key.into(), value);
    }

    pub fn remove(&self, key: &str) -> Option<serde_json::Value> {
        self.lock().remove(key)
    }

    fn snapshot(&self) -> JsonMap {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, JsonMap> {
        self.values.lock().expect("session values lock poisoned")
    }
}

/// Build the session middleware stage over a store.
pub fn session_middleware(store: Arc<dyn SessionStore>, config: SessionConfig) -> StageHandler {
    handler(move |mut req, next| {
        let store = store.clone();
        let config = config.clone();
        async move {
            let cookie_id = cookie_value(req.headers(), &config.cookie_name);
            let (id, data, fresh) = match cookie_id {
                Some(id) => match store.load(id.clone()).await? {
                    Some(data) => (id, data, false),
                    // Unknown or expired cookie: issue a new session.
                    None => (Uuid::new_v4().to_string(), JsonMap::new(), true),
                },
                None => (Uuid::new_v4().to_string(), JsonMap::new(), true),
            };

            let session = Session {
                id: id.clone(),
                fresh,
                values: Arc::new(Mutex::new(data)),
            };
            req.extensions_mut().insert(session.clone());

            let mut resp = next.run(req).await?;

            store.save(id.clone(), session.snapshot()).await?;
            if fresh {
                let cookie = format!(
                    "{}={}; Path=/; Max-Age={}; HttpOnly",
                    config.cookie_name, id, config.max_age_secs
                );
                resp.headers_mut()
                    .append(header::SET_COOKIE, HeaderValue::from_str(&cookie)?);
            }
            Ok(resp)
        }
    })
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_string())
}

/// File-backed store: one JSON file per session under a directory.
///
/// Expiry is best-effort: a file whose modification time is older than the
/// session max age is dropped on load. Files never loaded again stay on
/// disk; external cleanup owns those.
pub struct FileStore {
    directory: PathBuf,
    max_age: Duration,
}

impl FileStore {
    pub fn new(directory: impl Into<PathBuf>, max_age: Duration) -> Self {
        Self {
            directory: directory.into(),
            max_age,
        }
    }

    fn path_for(&self, id: &str) -> Option<PathBuf> {
        // Only UUID-shaped IDs touch the filesystem.
        let id = Uuid::parse_str(id).ok()?;
        Some(self.directory.join(format!("{id}.json")))
    }
}

impl SessionStore for FileStore {
    fn load(&self, id: String) -> BoxFuture<Result<Option<JsonMap>, BoxError>> {
        let path = self.path_for(&id);
        let max_age = self.max_age;
        Box::pin(async move {
            let Some(path) = path else { return Ok(None) };
            match tokio::fs::metadata(&path).await {
                Ok(meta) => {
                    let expired = meta
                        .modified()
                        .ok()
                        .and_then(|modified| modified.elapsed().ok())
                        .is_some_and(|age| age >= max_age);
                    if expired {
                        let _ = tokio::fs::remove_file(&path).await;
                        return Ok(None);
                    }
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                Err(err) => return Err(err.into()),
            }
            match tokio::fs::read(&path).await {
                Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(err) => Err(err.into()),
            }
        })
    }

    fn save(&self, id: String, data: JsonMap) -> BoxFuture<Result<(), BoxError>> {
        let path = self.path_for(&id);
        Box::pin(async move {
            let Some(path) = path else { return Ok(()) };
            let bytes = serde_json::to_vec(&data)?;
            tokio::fs::write(&path, bytes).await?;
            Ok(())
        })
    }
}

/// In-memory store, suitable for tests and single-process deployments.
///
/// Entries carry their last save time; a load past the session max age
/// evicts the entry instead of returning it.
pub struct MemoryStore {
    sessions: Arc<DashMap<String, (Instant, JsonMap)>>,
    max_age: Duration,
}

impl MemoryStore {
    pub fn new(max_age: Duration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            max_age,
        }
    }
}

impl SessionStore for MemoryStore {
    fn load(&self, id: String) -> BoxFuture<Result<Option<JsonMap>, BoxError>> {
        let sessions = self.sessions.clone();
        let max_age = self.max_age;
        Box::pin(async move {
            let expired = match sessions.get(&id) {
                Some(entry) => {
                    let (saved_at, data) = entry.value();
                    if saved_at.elapsed() < max_age {
                        return Ok(Some(data.clone()));
                    }
                    true
                }
                None => false,
            };
            if expired {
                sessions.remove(&id);
            }
            Ok(None)
        })
    }

    fn save(&self, id: String, data: JsonMap) -> BoxFuture<Result<(), BoxError>> {
        let sessions = self.sessions.clone();
        Box::pin(async move {
            sessions.insert(id, (Instant::now(), data));
            Ok(())
        })
    }
}

/// Factory for the default file-backed store. Setup creates the session
/// directory; that await is the commit engine's session barrier.
pub fn file_store_factory(config: SessionConfig) -> SessionFactory {
    Box::new(move || -> BoxFuture<Result<StageHandler, RouterError>> {
        Box::pin(async move {
            tokio::fs::create_dir_all(&config.directory)
                .await
                .map_err(|err| RouterError::SessionInit {
                    name: FILE_STORE_NAME.to_string(),
                    source: Box::new(err),
                })?;
            tracing::debug!(directory = %config.directory, "file session store ready");
            let store = Arc::new(FileStore::new(
                &config.directory,
                Duration::from_secs(config.max_age_secs),
            ));
            Ok(session_middleware(store, config))
        })
    })
}

/// Factory for the in-memory store.
pub fn memory_store_factory(config: SessionConfig) -> SessionFactory {
    Box::new(move || -> BoxFuture<Result<StageHandler, RouterError>> {
        Box::pin(async move {
            let store = Arc::new(MemoryStore::new(Duration::from_secs(config.max_age_secs)));
            Ok(session_middleware(store, config))
        })
    })
}
