//! Error types for the GitBook client
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use reqwest::header::HeaderMap;
use thiserror::Error;

/// The main error type for the GitBook client
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing path parameter '{name}' for '{template}'")]
    MissingPathParam { name: String, template: String },

    #[error("Path parameter '{name}' cannot be used as a path segment: {value:?}")]
    InvalidPathParam { name: String, value: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// The exchange completed but its body could not be read
    #[error("Failed to read response body (HTTP {status}): {message}")]
    Body {
        status: u16,
        headers: Box<HeaderMap>,
        message: String,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Data Processing Errors
    // ============================================================================
    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing path parameter error
    pub fn missing_param(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self::MissingPathParam {
            name: name.into(),
            template: template.into(),
        }
    }

    /// Create an invalid path parameter error
    pub fn invalid_param(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidPathParam {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Create an API status error
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: body.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// HTTP status carried by an API error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } | Error::Body { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if the server rejected the request (4xx)
    pub fn is_client_error(&self) -> bool {
        matches!(self.status(), Some(400..=499))
    }
}

/// Result type alias for the GitBook client
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
