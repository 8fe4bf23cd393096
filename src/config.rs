//! Client configuration
//!
//! Settings are layered: built-in defaults, then an optional YAML file,
//! then environment variables, then whatever the caller sets explicitly.
//!
//! ```yaml
//! token: gb_api_...
//! base_url: https://api.gitbook.com/
//! timeout_seconds: 30
//! ```

use crate::error::{Error, Result, ResultExt};
use crate::http::HttpClientConfig;
use crate::types::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Environment variable holding the API token
pub const TOKEN_ENV: &str = "GITBOOK_TOKEN";
/// Environment variable overriding the API base URL
pub const BASE_URL_ENV: &str = "GITBOOK_API_URL";

/// Configuration for [`crate::Client`]
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API token sent as a bearer token
    #[serde(default)]
    pub token: Option<String>,

    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// User agent string
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            user_agent: None,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ClientConfig {
    /// Default configuration with a token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Default::default()
        }
    }

    /// Load from a YAML file; missing keys take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml_str(&content)
    }

    /// Parse from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Overlay `GITBOOK_TOKEN` and `GITBOOK_API_URL` from the process environment
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_env_lookup(|name| std::env::var(name).ok())
    }

    /// Overlay values from an environment lookup function
    #[must_use]
    pub fn with_env_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(token) = lookup(TOKEN_ENV).filter(|t| !t.is_empty()) {
            self.token = Some(token);
        }
        if let Some(url) = lookup(BASE_URL_ENV).filter(|u| !u.is_empty()) {
            self.base_url = url;
        }
        self
    }

    /// Set the token
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the base URL
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Transport settings; fails when no token is configured
    pub fn http_config(&self) -> Result<HttpClientConfig> {
        let token = self
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::config(format!("no API token configured (set {TOKEN_ENV})")))?;

        let mut builder = HttpClientConfig::builder()
            .base_url(&self.base_url)
            .token(token)
            .timeout(Duration::from_secs(self.timeout_seconds));
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent);
        }
        Ok(builder.build())
    }
}
