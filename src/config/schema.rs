//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::session::store::FILE_STORE_NAME;

/// Root configuration for the registration engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Listener port.
    pub port: u16,

    /// Production mode: installs the terminal fallback handler that logs
    /// and redirects instead of exposing errors.
    pub production: bool,

    /// When true, static mounts are applied after the session middleware,
    /// so static content passes through session state (access-controlled
    /// assets).
    pub static_routes_in_session: bool,

    /// Name of the session store to activate at commit. Empty disables
    /// sessions.
    pub session_store_name: String,

    /// Fixed error page the production fallback redirects to.
    pub error_page: String,

    /// Session cookie and store settings.
    pub session: SessionConfig,

    /// Body-parsing collaborator settings.
    pub body_parser: BodyParserConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            production: false,
            static_routes_in_session: false,
            session_store_name: FILE_STORE_NAME.to_string(),
            error_page: "/error".to_string(),
            session: SessionConfig::default(),
            body_parser: BodyParserConfig::default(),
        }
    }
}

/// Session cookie and store settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cookie carrying the session ID.
    pub cookie_name: String,

    /// Cookie lifetime in seconds.
    pub max_age_secs: u64,

    /// Directory for the file-backed store.
    pub directory: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "sid".to_string(),
            max_age_secs: 60 * 60 * 24,
            directory: "./.tmp/sessions".to_string(),
        }
    }
}

/// Body-parsing collaborator settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BodyParserConfig {
    /// Maximum JSON body size in bytes.
    pub json_limit_bytes: usize,

    /// Maximum urlencoded body size in bytes.
    pub urlencoded_limit_bytes: usize,

    /// Maximum raw body size in bytes.
    pub raw_limit_bytes: usize,

    /// Exact paths whose bodies are kept as raw bytes instead of being
    /// content-type dispatched (webhook signature verification etc).
    pub raw_routes: Vec<String>,
}

impl Default for BodyParserConfig {
    fn default() -> Self {
        Self {
            json_limit_bytes: 100 * 1024,
            urlencoded_limit_bytes: 100 * 1024,
            raw_limit_bytes: 1024 * 1024,
            raw_routes: Vec::new(),
        }
    }
}
