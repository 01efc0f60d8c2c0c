//! # Standard layers
//!
//! The layer implementations the router ships with. All of them are
//! optional except [`SelectorLayer`], which terminates every useful chain.
//! A typical assembly, outermost first:
//!
//! ```text
//! SessionGateLayer → ContextEnrichmentLayer → EmbeddingLayer
//!     → MemoryLayer → ResponseFilterLayer → SelectorLayer
//! ```
//!
//! Order matters twice over: forward hooks run top-down, reverse hooks run
//! bottom-up, so the filter placed just before the selector sees the raw
//! capability output before the memory layer persists it.

pub mod context;
pub mod embedding;
pub mod filter;
pub mod memory;
pub mod selector;
pub mod session_gate;

pub use context::ContextEnrichmentLayer;
pub use embedding::EmbeddingLayer;
pub use filter::ResponseFilterLayer;
pub use memory::MemoryLayer;
pub use selector::SelectorLayer;
pub use session_gate::SessionGateLayer;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{
        Capability, CapabilityRegistry, CapabilitySelector, CheckOutcome,
    };
    use crate::config::SelectorConfig;
    use crate::interfaces::InMemoryStore;
    use crate::message::{RequestMessage, ResponseMessage, ResponseStatus};
    use crate::pipeline::Pipeline;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Echo capability counting how often it is touched.
    struct CountingEcho {
        checks: AtomicUsize,
        executions: AtomicUsize,
    }

    impl CountingEcho {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                checks: AtomicUsize::new(0),
                executions: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Capability for CountingEcho {
        fn id(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes the request content"
        }

        async fn check(&self, _request: &RequestMessage) -> CheckOutcome {
            self.checks.fetch_add(1, Ordering::SeqCst);
            CheckOutcome::score(0.9)
        }

        async fn execute(
            &self,
            request: &RequestMessage,
        ) -> Result<ResponseMessage, anyhow::Error> {
            self.executions.fetch_add(1, Ordering::SeqCst);
            Ok(ResponseMessage::reply(request, request.content.clone()))
        }
    }

    fn full_pipeline(echo: Arc<CountingEcho>, store: Arc<InMemoryStore>) -> Pipeline {
        let registry = Arc::new(CapabilityRegistry::new());
        registry.register(echo).unwrap();
        let selector = CapabilitySelector::new(registry, SelectorConfig::default());

        let gate = SessionGateLayer::new();
        gate.allow("console", "tester");

        Pipeline::builder()
            .layer(Arc::new(gate))
            .layer(Arc::new(ContextEnrichmentLayer::new(HashMap::new())))
            .layer(Arc::new(MemoryLayer::new(store)))
            .layer(Arc::new(ResponseFilterLayer::with_builtin_patterns()))
            .layer(Arc::new(SelectorLayer::new(selector)))
            .build()
    }

    #[tokio::test]
    async fn full_chain_round_trip() {
        let _ = env_logger::builder().is_test(true).try_init();
        let echo = CountingEcho::new();
        let store = InMemoryStore::new();
        let pipeline = full_pipeline(echo.clone(), store.clone());

        let request = RequestMessage::new("console", "route me");
        let id = request.id();
        let response = pipeline.handle(request).await;

        assert_eq!(response.request_id(), id);
        assert_eq!(response.status, ResponseStatus::Success);
        assert_eq!(response.content, "route me");
        assert_eq!(echo.executions.load(Ordering::SeqCst), 1);
        // selection metadata and the enrichment layer's duration stamp both
        // survived the reverse pass
        assert!(response.metadata.contains_key("capability"));
        assert!(response.metadata.contains_key(context::META_HANDLED_MS));
        // the memory layer persisted the (filtered) exchange
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn unknown_arbiter_verdict_resolves_at_the_handler() {
        use crate::interfaces::StaticArbiter;

        struct Lukewarm;

        #[async_trait]
        impl Capability for Lukewarm {
            fn id(&self) -> &str {
                "lukewarm"
            }

            fn description(&self) -> &str {
                "never confident"
            }

            async fn check(&self, _request: &RequestMessage) -> CheckOutcome {
                CheckOutcome::score(0.3)
            }

            async fn execute(
                &self,
                request: &RequestMessage,
            ) -> Result<ResponseMessage, anyhow::Error> {
                Ok(ResponseMessage::reply(request, "tepid"))
            }
        }

        let registry = Arc::new(CapabilityRegistry::new());
        registry.register(Arc::new(Lukewarm)).unwrap();
        let selector = CapabilitySelector::new(registry, SelectorConfig::default())
            .with_arbiter(Arc::new(StaticArbiter::new("no-such-capability")));
        let pipeline = Pipeline::builder()
            .layer(Arc::new(SelectorLayer::new(selector)))
            .build();

        let request = RequestMessage::new("console", "hmm");
        let id = request.id();
        let response = pipeline.handle(request).await;

        assert_eq!(response.request_id(), id);
        assert_eq!(response.status, ResponseStatus::NoCapability);
    }

    #[tokio::test]
    async fn unknown_session_never_reaches_the_selector() {
        let echo = CountingEcho::new();
        let store = InMemoryStore::new();
        let pipeline = full_pipeline(echo.clone(), store.clone());

        let request = RequestMessage::new("stranger", "route me");
        let response = pipeline.handle(request).await;

        assert_eq!(response.status, ResponseStatus::Rejected);
        assert_eq!(echo.checks.load(Ordering::SeqCst), 0);
        assert_eq!(echo.executions.load(Ordering::SeqCst), 0);
        // the memory layer's forward hook never ran either
        assert!(store.is_empty());
    }
}
