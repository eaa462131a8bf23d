//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges and path shapes
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::config::schema::RouterConfig;
use crate::session::store::FILE_STORE_NAME;

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    ZeroPort,
    RelativeErrorPage(String),
    RelativeRawRoute(String),
    EmptySessionCookieName,
    ZeroSessionMaxAge,
    EmptySessionDirectory,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::ZeroPort => write!(f, "port must be non-zero"),
            ValidationError::RelativeErrorPage(page) => {
                write!(f, "error_page '{}' must start with '/'", page)
            }
            ValidationError::RelativeRawRoute(route) => {
                write!(f, "raw route '{}' must start with '/'", route)
            }
            ValidationError::EmptySessionCookieName => {
                write!(f, "session cookie_name must not be empty")
            }
            ValidationError::ZeroSessionMaxAge => {
                write!(f, "session max_age_secs must be non-zero")
            }
            ValidationError::EmptySessionDirectory => {
                write!(f, "session directory must be set for the file store")
            }
        }
    }
}

/// Validate a configuration, collecting every failure.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }
    if !config.error_page.starts_with('/') {
        errors.push(ValidationError::RelativeErrorPage(config.error_page.clone()));
    }
    for route in &config.body_parser.raw_routes {
        if !route.starts_with('/') {
            errors.push(ValidationError::RelativeRawRoute(route.clone()));
        }
    }

    if !config.session_store_name.is_empty() {
        if config.session.cookie_name.is_empty() {
            errors.push(ValidationError::EmptySessionCookieName);
        }
        if config.session.max_age_secs == 0 {
            errors.push(ValidationError::ZeroSessionMaxAge);
        }
        if config.session_store_name == FILE_STORE_NAME && config.session.directory.is_empty() {
            errors.push(ValidationError::EmptySessionDirectory);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
