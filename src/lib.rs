//! # Switchboard
//!
//! A capability-routing core for interactive agent systems.
//!
//! One inbound [`RequestMessage`] travels forward through an ordered chain
//! of [`Layer`]s; the terminal layer selects exactly one registered
//! [`Capability`] with a two-stage algorithm (deterministic score ranking,
//! then fallback arbitration) and executes it; the resulting
//! [`ResponseMessage`] travels back through the same chain in reverse.
//! [`Pipeline::handle`] never fails without producing a response, so the
//! embedding interface always has one uniform object to present.
//!
//! The core is transport-agnostic: it operates on in-process value types,
//! and consumes its externals (fallback arbiter, embedding provider,
//! persistence store) through the narrow traits in [`interfaces`].

pub mod capabilities;
pub mod config;
pub mod error;
pub mod interfaces;
pub mod layers;
pub mod message;
pub mod pipeline;

pub use capabilities::{
    Capability, CapabilityRecord, CapabilityRegistry, CapabilitySelector, CheckOutcome,
    FallbackChatCapability, PatternCapability, Score,
};
pub use config::{FilterConfig, RouterConfig, SelectorConfig};
pub use error::{ConfigError, RegistryError, SelectorError};
pub use interfaces::{Arbiter, CandidateDescription, Embedder, MemoryStore};
pub use layers::{
    ContextEnrichmentLayer, EmbeddingLayer, MemoryLayer, ResponseFilterLayer, SelectorLayer,
    SessionGateLayer,
};
pub use message::{RequestMessage, ResponseMessage, ResponseStatus};
pub use pipeline::{ForwardOutcome, Layer, Pipeline, PipelineBuilder, ReverseOutcome};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
