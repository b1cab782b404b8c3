//! Builder pattern for orchestrator configuration.
//!
//! Provides a fluent API for wiring a [`SessionOrchestrator`] to its
//! resolver, engine and observer.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use listener_service::{LifecycleEvent, SessionOrchestrator, WsEngine};
//!
//! # fn example() -> listener_service::Result<()> {
//! let observer = Arc::new(|event: LifecycleEvent| println!("{event}"));
//!
//! let orchestrator = SessionOrchestrator::builder()
//!     .engine(WsEngine::new())
//!     .observer(&observer)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, Weak};

use url::Url;

use crate::config::{ConfigResolver, DEFAULT_CONFIG_URL, ResolveEndpoint};
use crate::error::{Error, Result};
use crate::observer::Observer;
use crate::transport::{TransportEngine, WsEngine};

use super::orchestrator::SessionOrchestrator;

// ============================================================================
// Constants
// ============================================================================

/// Schemes accepted for the configuration document URL.
const CONFIG_SCHEMES: [&str; 2] = ["http", "https"];

// ============================================================================
// OrchestratorBuilder
// ============================================================================

/// Builder for configuring a [`SessionOrchestrator`].
///
/// Use [`SessionOrchestrator::builder()`] to create a new builder. Only the
/// observer is required; everything else has a default.
#[derive(Default, Clone)]
pub struct OrchestratorBuilder {
    /// Configuration document URL.
    config_url: Option<String>,
    /// Endpoint source.
    resolver: Option<Arc<dyn ResolveEndpoint>>,
    /// Transport engine.
    engine: Option<Arc<dyn TransportEngine>>,
    /// Observer reference.
    observer: Option<Weak<dyn Observer>>,
}

impl fmt::Debug for OrchestratorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrchestratorBuilder")
            .field("config_url", &self.config_url)
            .field("resolver", &self.resolver.is_some())
            .field("engine", &self.engine.is_some())
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

// ============================================================================
// OrchestratorBuilder Implementation
// ============================================================================

impl OrchestratorBuilder {
    /// Creates a new builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration document URL.
    ///
    /// Defaults to [`DEFAULT_CONFIG_URL`].
    #[inline]
    #[must_use]
    pub fn config_url(mut self, url: impl Into<String>) -> Self {
        self.config_url = Some(url.into());
        self
    }

    /// Sets the endpoint resolver.
    ///
    /// Defaults to [`ConfigResolver::new()`].
    #[inline]
    #[must_use]
    pub fn resolver<R>(mut self, resolver: R) -> Self
    where
        R: ResolveEndpoint + 'static,
    {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Sets an already shared endpoint resolver.
    #[inline]
    #[must_use]
    pub fn shared_resolver(mut self, resolver: Arc<dyn ResolveEndpoint>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Sets the transport engine.
    ///
    /// Defaults to [`WsEngine::new()`].
    #[inline]
    #[must_use]
    pub fn engine<E>(mut self, engine: E) -> Self
    where
        E: TransportEngine + 'static,
    {
        self.engine = Some(Arc::new(engine));
        self
    }

    /// Sets an already shared transport engine.
    #[inline]
    #[must_use]
    pub fn shared_engine(mut self, engine: Arc<dyn TransportEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Sets the observer.
    ///
    /// Only a weak reference is kept: the host owns the observer, and
    /// events are silently dropped once it is gone.
    #[inline]
    #[must_use]
    pub fn observer<O>(mut self, observer: &Arc<O>) -> Self
    where
        O: Observer + 'static,
    {
        self.observer = Some(Arc::downgrade(observer) as Weak<dyn Observer>);
        self
    }

    /// Sets the observer from an existing weak reference.
    #[inline]
    #[must_use]
    pub fn observer_weak(mut self, observer: Weak<dyn Observer>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Builds the orchestrator with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no observer is set
    /// - [`Error::Config`] if the configuration URL is not http(s)
    pub fn build(self) -> Result<SessionOrchestrator> {
        let observer = self.validate_observer()?;
        let config_url = self.validate_config_url()?;

        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(ConfigResolver::new()));
        let engine = self.engine.unwrap_or_else(|| Arc::new(WsEngine::new()));

        Ok(SessionOrchestrator::new(config_url, resolver, engine, observer))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl OrchestratorBuilder {
    /// Validates the observer configuration.
    fn validate_observer(&self) -> Result<Weak<dyn Observer>> {
        self.observer.clone().ok_or_else(|| {
            Error::config(
                "Observer is required. Use .observer() to set it.\n\
                 Example: SessionOrchestrator::builder().observer(&observer)",
            )
        })
    }

    /// Validates the configuration document URL.
    fn validate_config_url(&self) -> Result<String> {
        let raw = self
            .config_url
            .clone()
            .unwrap_or_else(|| DEFAULT_CONFIG_URL.to_string());

        let url = Url::parse(&raw)
            .map_err(|e| Error::config(format!("Invalid config URL '{raw}': {e}")))?;

        if !CONFIG_SCHEMES.contains(&url.scheme()) {
            return Err(Error::config(format!(
                "Config URL must use http or https, got '{}': {raw}",
                url.scheme()
            )));
        }

        Ok(raw)
    }
}

// ============================================================================
// Tests
// ============================================================================
