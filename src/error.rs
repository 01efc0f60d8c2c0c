//! Error types for the routing core.
//!
//! Two legs of the error taxonomy are deliberately *not* errors: a layer
//! rejecting a request on the forward pass produces a synthesized
//! [`ResponseMessage`](crate::message::ResponseMessage) via
//! [`ForwardOutcome::Respond`](crate::pipeline::ForwardOutcome), and a
//! capability declining to score produces
//! [`CheckOutcome::Abstain`](crate::capabilities::CheckOutcome). Both are
//! expected control flow and are recovered locally, never propagated.

use thiserror::Error;

/// Errors raised by the capability registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A capability with the same identifier is already registered.
    #[error("capability identifier already registered: {id}")]
    DuplicateIdentifier { id: String },
}

/// Errors raised by the capability selector.
///
/// All variants are resolved into an error-status `ResponseMessage` at the
/// selector layer; callers of `Pipeline::handle` never observe them directly.
#[derive(Debug, Error)]
pub enum SelectorError {
    /// Neither the score stage nor the fallback arbiter produced a choice.
    #[error("no capability selected: {reason}")]
    NoCapabilitySelected { reason: String },

    /// The fallback arbiter failed or timed out.
    ///
    /// Treated like [`SelectorError::NoCapabilitySelected`] from the caller's
    /// perspective, but logged with the underlying cause.
    #[error("fallback arbiter unavailable: {source}")]
    ArbiterUnavailable {
        #[source]
        source: anyhow::Error,
    },

    /// The chosen capability failed during execution.
    ///
    /// The selector does not retry with the next-best candidate; explicit
    /// fallback is an extension point, not implicit behavior.
    #[error("capability '{capability}' failed during execution: {source}")]
    CapabilityExecutionFailed {
        capability: String,
        #[source]
        source: anyhow::Error,
    },

    /// The chosen capability exceeded the configured execution timeout.
    #[error("capability '{capability}' timed out after {timeout_ms}ms")]
    ExecutionTimeout { capability: String, timeout_ms: u64 },
}

/// Errors raised while loading or validating router configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid deny pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
