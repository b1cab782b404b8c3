//! Endpoint resolution from a remote configuration document.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Endpoint`] | Validated `ws://`/`wss://` URL |
//! | [`ConfigResolver`] | HTTP fetch + key fallback + validation |
//! | [`ResolveEndpoint`] | Trait consumed by the orchestrator |
//!
//! # Example
//!
//! ```no_run
//! use listener_service::config::{ConfigResolver, DEFAULT_CONFIG_URL};
//!
//! # async fn example() -> listener_service::Result<()> {
//! let endpoint = ConfigResolver::new().resolve(DEFAULT_CONFIG_URL).await?;
//! println!("streaming from {endpoint}");
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Validated websocket endpoint.
pub mod endpoint;

/// HTTP configuration resolver.
pub mod resolver;

// ============================================================================
// Constants
// ============================================================================

/// Configuration document used when none is specified.
pub const DEFAULT_CONFIG_URL: &str =
    "https://raw.githubusercontent.com/Velezer/listener-service/refs/heads/main/config.json";

// ============================================================================
// Re-exports
// ============================================================================

pub use endpoint::{ALLOWED_SCHEMES, Endpoint};
pub use resolver::{ConfigResolver, DEFAULT_CONFIG_KEYS, ResolveEndpoint, extract_endpoint};
