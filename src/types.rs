//! Common types used throughout the client
//!
//! This module contains shared type definitions, type aliases
//! and constants used across multiple modules.

/// Default API host
pub const DEFAULT_BASE_URL: &str = "https://api.gitbook.com/";

/// API version every endpoint path is prefixed with
pub const API_VERSION: &str = "v1";

/// Query parameters, in the order they are sent
pub type Query = Vec<(String, String)>;
