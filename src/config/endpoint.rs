//! Validated websocket endpoint.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Schemes a streaming endpoint may use.
pub const ALLOWED_SCHEMES: [&str; 2] = ["ws", "wss"];

// ============================================================================
// Endpoint
// ============================================================================

/// A `ws://` or `wss://` URL that passed validation.
///
/// The only way to obtain one is [`Endpoint::parse`], so a transport engine
/// never sees an unchecked string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Trimmed string as found in the configuration document.
    raw: String,
    /// Parsed form.
    url: Url,
}

impl Endpoint {
    /// Parses and validates an endpoint string.
    ///
    /// Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidEndpoint`] if the string is not a URL
    /// - [`Error::DisallowedScheme`] if the scheme is not `ws` or `wss`
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();

        let url = Url::parse(raw).map_err(|e| Error::invalid_endpoint(raw, e.to_string()))?;

        if !ALLOWED_SCHEMES.contains(&url.scheme()) {
            return Err(Error::disallowed_scheme(raw, url.scheme()));
        }

        Ok(Self {
            raw: raw.to_string(),
            url,
        })
    }

    /// Returns the endpoint exactly as configured.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the scheme (`ws` or `wss`).
    #[inline]
    #[must_use]
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Returns `true` for `wss` endpoints.
    #[inline]
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.url.scheme() == "wss"
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<&str> for Endpoint {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

// ============================================================================
// Tests
// ============================================================================
