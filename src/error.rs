//! Error types for the listener service.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use listener_service::{ConfigResolver, Result};
//!
//! async fn example() -> Result<()> {
//!     let endpoint = ConfigResolver::new()
//!         .resolve("https://example.com/config.json")
//!         .await?;
//!     println!("{endpoint}");
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Resolution | [`Error::ConfigFetch`], [`Error::ConfigStatus`], [`Error::InvalidConfig`], [`Error::MissingEndpoint`], [`Error::InvalidEndpoint`], [`Error::DisallowedScheme`] |
//! | Transport | [`Error::Connection`], [`Error::Decode`] |
//! | External | [`Error::Io`], [`Error::WebSocket`], [`Error::Http`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when orchestrator or engine configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Resolution Errors
    // ========================================================================
    /// The configuration document could not be fetched.
    ///
    /// Covers DNS, TLS, connect and timeout failures.
    #[error("Failed to fetch config from {url}: {message}")]
    ConfigFetch {
        /// URL of the configuration document.
        url: String,
        /// Description of the transport failure.
        message: String,
    },

    /// The configuration server answered with a non-success status.
    #[error("Unexpected HTTP status {status} from {url}")]
    ConfigStatus {
        /// URL of the configuration document.
        url: String,
        /// HTTP status code received.
        status: u16,
    },

    /// The configuration body is empty or not a JSON object.
    #[error("Invalid JSON payload: {message}")]
    InvalidConfig {
        /// Description of the parse failure.
        message: String,
    },

    /// None of the recognized keys holds a non-blank value.
    #[error("Missing websocket URL in config. Supported keys: [{}]", keys.join(", "))]
    MissingEndpoint {
        /// Recognized keys, in lookup order.
        keys: Vec<String>,
    },

    /// The extracted value is not a valid URL.
    #[error("Invalid websocket URL in config: {url} ({message})")]
    InvalidEndpoint {
        /// The offending value.
        url: String,
        /// Parser error message.
        message: String,
    },

    /// The extracted URL does not use `ws` or `wss`.
    #[error("Websocket URL must use ws or wss scheme: {url}")]
    DisallowedScheme {
        /// The offending URL.
        url: String,
        /// Scheme found in the URL.
        scheme: String,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// WebSocket connection failed.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Incoming frame could not be decoded as text.
    #[error("Message decode error: {message}")]
    Decode {
        /// Description of the decode failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a config fetch error.
    #[inline]
    pub fn config_fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigFetch {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a non-success status error.
    #[inline]
    pub fn config_status(url: impl Into<String>, status: u16) -> Self {
        Self::ConfigStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an invalid config error.
    #[inline]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates a missing endpoint error listing the recognized keys.
    #[inline]
    pub fn missing_endpoint<S: AsRef<str>>(keys: &[S]) -> Self {
        Self::MissingEndpoint {
            keys: keys.iter().map(|k| k.as_ref().to_string()).collect(),
        }
    }

    /// Creates an invalid endpoint error.
    #[inline]
    pub fn invalid_endpoint(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a disallowed scheme error.
    #[inline]
    pub fn disallowed_scheme(url: impl Into<String>, scheme: impl Into<String>) -> Self {
        Self::DisallowedScheme {
            url: url.into(),
            scheme: scheme.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a decode error.
    #[inline]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this error aborted endpoint resolution.
    #[inline]
    #[must_use]
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigFetch { .. }
                | Self::ConfigStatus { .. }
                | Self::InvalidConfig { .. }
                | Self::MissingEndpoint { .. }
                | Self::InvalidEndpoint { .. }
                | Self::DisallowedScheme { .. }
                | Self::Http(_)
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::WebSocket(_))
    }
}

// ============================================================================
// Tests
// ============================================================================
