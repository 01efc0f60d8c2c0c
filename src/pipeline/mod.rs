//! # Pipeline
//!
//! The bidirectional layer chain. A request flows forward through every
//! layer in order until one answers it (normally the terminal selector
//! layer, possibly an earlier gate); the response then flows backward
//! through exactly the layers the request reached, in reverse order.
//!
//! ```text
//! handle(request)
//!   │ tell               tell               tell
//!   ▼                                         │
//! Layer₁ ──────────► Layer₂ ──────────► SelectorLayer ──► capability
//!   ▲                                         │
//!   │ respond            respond              ▼
//!   ◄────────────────────────────────────── response
//! ```

pub mod executor;
pub mod layer;

pub use executor::{Pipeline, PipelineBuilder};
pub use layer::{ForwardOutcome, Layer, ReverseOutcome};
