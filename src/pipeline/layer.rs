//! Layer contract: the two-sided pipeline stage.
//!
//! # Design Principles
//!
//! - Both hooks have pass-through defaults, so a layer implements only the
//!   side it cares about (a response filter overrides `respond` alone, the
//!   terminal selector layer overrides `tell` alone).
//! - `&self` receivers: layers are shared across concurrent traversals,
//!   interior mutability where a layer keeps state.
//! - Outcomes are enums, not errors. A layer that wants to stop a request
//!   answers it; the executor guarantees the reverse pass still runs.

use async_trait::async_trait;

use crate::message::{RequestMessage, ResponseMessage};

/// What a layer decided on the forward pass.
#[derive(Debug)]
pub enum ForwardOutcome {
    /// Pass the (possibly modified) request to the next layer.
    Next(RequestMessage),
    /// Answer the request here. Short-circuits the remaining forward steps
    /// and the selector; the reverse pass starts at this layer. Used both
    /// for early rejection and by the terminal selector layer.
    Respond(ResponseMessage),
}

/// What a layer decided on the reverse pass.
#[derive(Debug)]
pub enum ReverseOutcome {
    /// Pass the (possibly modified) response to the previous layer.
    Pass(ResponseMessage),
    /// Substitute a different response (e.g. a canned refusal). The
    /// replacement continues down the chain in place of the original.
    Replace(ResponseMessage),
}

/// A pipeline stage with forward (request) and reverse (response) hooks.
///
/// Layer order is fixed at pipeline construction and strictly sequential
/// within a traversal. Variants are an open set: authentication gates,
/// context enrichment, embedding, response filtering, the terminal
/// capability-selector layer.
#[async_trait]
pub trait Layer: Send + Sync {
    /// Layer name, for logs.
    fn name(&self) -> &str;

    /// Forward hook. Default passes the request through untouched.
    async fn tell(&self, request: RequestMessage) -> ForwardOutcome {
        ForwardOutcome::Next(request)
    }

    /// Reverse hook. Default passes the response through untouched.
    async fn respond(&self, response: ResponseMessage) -> ReverseOutcome {
        ReverseOutcome::Pass(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Inert;

    #[async_trait]
    impl Layer for Inert {
        fn name(&self) -> &str {
            "inert"
        }
    }

    #[tokio::test]
    async fn default_hooks_pass_through() {
        let layer = Inert;
        let request = RequestMessage::new("console", "hello");
        let id = request.id();
        match layer.tell(request).await {
            ForwardOutcome::Next(passed) => assert_eq!(passed.id(), id),
            ForwardOutcome::Respond(_) => panic!("default tell must pass through"),
        }
        let response = ResponseMessage::error(id, "x");
        match layer.respond(response).await {
            ReverseOutcome::Pass(passed) => assert_eq!(passed.request_id(), id),
            ReverseOutcome::Replace(_) => panic!("default respond must pass through"),
        }
    }
}
