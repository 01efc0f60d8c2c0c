//! # Capabilities
//!
//! A capability is a registered handler that can assess its own fitness for
//! a request and, if chosen, produce the response. This module holds the
//! contract ([`Capability`]), the process-wide [`CapabilityRegistry`], the
//! two-stage [`CapabilitySelector`], and the reference implementations.
//!
//! ## Selection flow
//!
//! 1. The selector takes an insertion-ordered registry snapshot.
//! 2. Every capability's `check` runs concurrently, bounded per call;
//!    timeouts and abstentions rank at the minimum score.
//! 3. A maximum score strictly above 0.5 selects immediately, ties going to
//!    the first-registered capability.
//! 4. Otherwise the fallback arbiter picks among non-abstaining candidates.
//! 5. The chosen capability's `execute` runs exactly once; failures surface
//!    wrapped with the capability identifier.

pub mod builtin;
pub mod capability;
pub mod registry;
pub mod selector;

pub use builtin::{FallbackChatCapability, PatternCapability, PatternCapabilityBuilder};
pub use capability::{Capability, CheckOutcome, Score};
pub use registry::{CapabilityRecord, CapabilityRegistry};
pub use selector::CapabilitySelector;
