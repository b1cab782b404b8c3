//! Remote configuration lookup.
//!
//! Fetches a JSON object over HTTP and extracts the streaming endpoint from
//! the first recognized key holding a non-blank value.
//!
//! # Key Fallback
//!
//! Keys are scanned in a fixed order, current key first:
//!
//! | Order | Key |
//! |-------|-----|
//! | 1 | `wssFeederServiceAggTrade` |
//! | 2 | `WS_FEEDER_SERVICE` (legacy) |
//!
//! Values that are not JSON strings count as absent.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

use super::Endpoint;

// ============================================================================
// Constants
// ============================================================================

/// Recognized configuration keys, current first.
pub const DEFAULT_CONFIG_KEYS: [&str; 2] = ["wssFeederServiceAggTrade", "WS_FEEDER_SERVICE"];

/// Default timeout for the configuration request.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// ResolveEndpoint
// ============================================================================

/// Source of streaming endpoints.
///
/// Implemented by [`ConfigResolver`]; the orchestrator depends only on this
/// trait.
#[async_trait]
pub trait ResolveEndpoint: Send + Sync {
    /// Resolves the endpoint described by the document at `config_url`.
    async fn resolve(&self, config_url: &str) -> Result<Endpoint>;
}

// ============================================================================
// ConfigResolver
// ============================================================================

/// HTTP-backed endpoint resolver.
///
/// Performs exactly one GET per [`resolve`](Self::resolve) call and never
/// retries.
///
/// # Example
///
/// ```no_run
/// use listener_service::ConfigResolver;
///
/// # async fn example() -> listener_service::Result<()> {
/// let endpoint = ConfigResolver::new()
///     .resolve("https://example.com/config.json")
///     .await?;
/// assert!(endpoint.scheme() == "ws" || endpoint.scheme() == "wss");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    /// HTTP client.
    client: Client,
    /// Recognized keys, in lookup order.
    keys: Vec<String>,
    /// Per-request timeout.
    timeout: Duration,
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// ConfigResolver - Constructors
// ============================================================================

impl ConfigResolver {
    /// Creates a resolver with the default keys and timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            keys: DEFAULT_CONFIG_KEYS.iter().map(ToString::to_string).collect(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Replaces the recognized keys.
    ///
    /// Order matters: earlier keys win.
    #[must_use]
    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the request timeout.
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Uses a preconfigured HTTP client.
    #[inline]
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }
}

// ============================================================================
// ConfigResolver - Public API
// ============================================================================

impl ConfigResolver {
    /// Returns the recognized keys in lookup order.
    #[inline]
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Returns the request timeout.
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetches the document at `config_url` and extracts the endpoint.
    ///
    /// # Errors
    ///
    /// - [`Error::ConfigFetch`] if the server cannot be reached
    /// - [`Error::ConfigStatus`] if the status is not 2xx
    /// - [`Error::Http`] if the body cannot be read
    /// - Any error of [`extract_endpoint`]
    pub async fn resolve(&self, config_url: &str) -> Result<Endpoint> {
        debug!(url = config_url, "Fetching config document");

        let response = self
            .client
            .get(config_url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                warn!(url = config_url, error = %e, "Config request failed");
                Error::config_fetch(config_url, e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = config_url, status = status.as_u16(), "Config request rejected");
            return Err(Error::config_status(config_url, status.as_u16()));
        }

        let body = response.text().await?;
        let endpoint = extract_endpoint(&body, &self.keys)?;

        info!(endpoint = %endpoint, "Endpoint resolved");

        Ok(endpoint)
    }
}

#[async_trait]
impl ResolveEndpoint for ConfigResolver {
    async fn resolve(&self, config_url: &str) -> Result<Endpoint> {
        ConfigResolver::resolve(self, config_url).await
    }
}

// ============================================================================
// Extraction
// ============================================================================

/// Extracts the endpoint from a configuration body.
///
/// Returns the first key in `keys` whose value, trimmed, is non-empty.
///
/// # Errors
///
/// - [`Error::InvalidConfig`] if the body is empty or not a JSON object
/// - [`Error::MissingEndpoint`] if no key holds a non-blank string
/// - [`Error::InvalidEndpoint`] / [`Error::DisallowedScheme`] from
///   [`Endpoint::parse`]
pub fn extract_endpoint<S: AsRef<str>>(body: &str, keys: &[S]) -> Result<Endpoint> {
    let document = parse_document(body)?;

    let value = keys
        .iter()
        .find_map(|key| {
            document
                .get(key.as_ref())
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|value| !value.is_empty())
        })
        .ok_or_else(|| Error::missing_endpoint(keys))?;

    Endpoint::parse(value)
}

/// Parses the body as a JSON object.
fn parse_document(body: &str) -> Result<Map<String, Value>> {
    if body.trim().is_empty() {
        return Err(Error::invalid_config("empty body"));
    }

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(Error::invalid_config("expected a JSON object")),
        Err(e) => Err(Error::invalid_config(e.to_string())),
    }
}

// ============================================================================
// Tests
// ============================================================================
