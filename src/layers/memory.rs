//! Persistence of handled request/response pairs.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::interfaces::MemoryStore;
use crate::message::{RequestMessage, ResponseMessage};
use crate::pipeline::{ForwardOutcome, Layer, ReverseOutcome};

/// Writes each completed exchange to the injected store.
///
/// The forward pass captures a copy of the request keyed by id; the reverse
/// pass pairs it with the response and appends. Store failure is logged and
/// never fails the pipeline. The executor's matched-reverse guarantee keeps
/// the capture table drained.
pub struct MemoryLayer {
    store: Arc<dyn MemoryStore>,
    inflight: DashMap<Uuid, RequestMessage>,
}

impl MemoryLayer {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self {
            store,
            inflight: DashMap::new(),
        }
    }
}

#[async_trait]
impl Layer for MemoryLayer {
    fn name(&self) -> &str {
        "memory"
    }

    async fn tell(&self, request: RequestMessage) -> ForwardOutcome {
        self.inflight.insert(request.id(), request.clone());
        ForwardOutcome::Next(request)
    }

    async fn respond(&self, response: ResponseMessage) -> ReverseOutcome {
        match self.inflight.remove(&response.request_id()) {
            Some((_, request)) => {
                if let Err(error) = self.store.append(&request, &response).await {
                    log::warn!(
                        "failed to persist exchange for request {}: {error:#}",
                        response.request_id()
                    );
                }
            }
            None => {
                log::debug!(
                    "no captured request for response {}, skipping persistence",
                    response.request_id()
                );
            }
        }
        ReverseOutcome::Pass(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::InMemoryStore;

    struct BrokenStore;

    #[async_trait]
    impl MemoryStore for BrokenStore {
        async fn append(
            &self,
            _request: &RequestMessage,
            _response: &ResponseMessage,
        ) -> Result<(), anyhow::Error> {
            anyhow::bail!("disk full")
        }
    }

    #[tokio::test]
    async fn completed_exchange_is_persisted() {
        let store = InMemoryStore::new();
        let layer = MemoryLayer::new(store.clone());
        let request = RequestMessage::new("console", "remember me");
        let id = request.id();

        let ForwardOutcome::Next(request) = layer.tell(request).await else {
            panic!("memory layer never rejects");
        };
        let response = ResponseMessage::reply(&request, "done");
        let ReverseOutcome::Pass(_) = layer.respond(response).await else {
            panic!("memory layer never replaces");
        };

        let entries = store.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0.id(), id);
        assert_eq!(entries[0].1.content, "done");
        assert!(layer.inflight.is_empty());
    }

    #[tokio::test]
    async fn store_failure_never_fails_the_pipeline() {
        let layer = MemoryLayer::new(Arc::new(BrokenStore));
        let request = RequestMessage::new("console", "remember me");

        let ForwardOutcome::Next(request) = layer.tell(request).await else {
            panic!("memory layer never rejects");
        };
        let response = ResponseMessage::reply(&request, "done");
        match layer.respond(response).await {
            ReverseOutcome::Pass(passed) => assert_eq!(passed.content, "done"),
            ReverseOutcome::Replace(_) => panic!("memory layer never replaces"),
        }
    }
}
