//! Contracts for the external collaborators the core consumes.
//!
//! The routing core never talks to a language model, an embedding service, or
//! a persistence backend directly. Each is injected as a trait object behind
//! one of the narrow contracts here; production adapters live with the
//! embedding application. Reference implementations suitable for tests and
//! demos ([`StaticArbiter`], [`InMemoryStore`]) live alongside the traits so
//! they are substitutable anywhere the real dependency is.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::message::{RequestMessage, ResponseMessage};

// ---------------------------------------------------------------------------
// Arbiter
// ---------------------------------------------------------------------------

/// One candidate offered to the fallback arbiter.
#[derive(Debug, Clone)]
pub struct CandidateDescription {
    pub id: String,
    pub description: String,
}

/// Fallback decision function, typically language-model-backed.
///
/// Invoked only when no capability scores above the acceptance threshold.
/// The arbiter returns exactly one capability identifier; an identifier the
/// registry does not know resolves to a no-capability outcome at the
/// selector, never a guess. Disambiguation of an ambiguous arbiter is an
/// extension point, deliberately unspecified here.
///
/// Implementations should be deterministic for identical inputs so selection
/// outcomes are reproducible in tests; where the backing model is not, tests
/// substitute a double such as [`StaticArbiter`].
#[async_trait]
pub trait Arbiter: Send + Sync {
    /// Choose one capability identifier for the request content.
    async fn choose(
        &self,
        request_content: &str,
        candidates: &[CandidateDescription],
    ) -> Result<String, anyhow::Error>;
}

/// Arbiter double that always returns a fixed identifier.
#[derive(Debug, Clone)]
pub struct StaticArbiter {
    verdict: String,
}

impl StaticArbiter {
    pub fn new(verdict: impl Into<String>) -> Self {
        Self {
            verdict: verdict.into(),
        }
    }
}

#[async_trait]
impl Arbiter for StaticArbiter {
    async fn choose(
        &self,
        _request_content: &str,
        _candidates: &[CandidateDescription],
    ) -> Result<String, anyhow::Error> {
        Ok(self.verdict.clone())
    }
}

// ---------------------------------------------------------------------------
// Embedder
// ---------------------------------------------------------------------------

/// Embedding/vectorization provider consumed by the embedding layer.
///
/// Failure is non-fatal to the layer unless the layer is configured to treat
/// the embedding as required.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed `text` into a vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, anyhow::Error>;
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Persistence contract for request/response pairs.
///
/// Append failures are logged by the memory layer and never pipeline-fatal.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Persist one handled pair.
    async fn append(
        &self,
        request: &RequestMessage,
        response: &ResponseMessage,
    ) -> Result<(), anyhow::Error>;
}

/// Store double keeping pairs in memory, in arrival order.
#[derive(Default)]
pub struct InMemoryStore {
    entries: Mutex<Vec<(RequestMessage, ResponseMessage)>>,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of everything appended so far.
    pub fn entries(&self) -> Vec<(RequestMessage, ResponseMessage)> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn append(
        &self,
        request: &RequestMessage,
        response: &ResponseMessage,
    ) -> Result<(), anyhow::Error> {
        self.entries.lock().push((request.clone(), response.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_arbiter_returns_its_verdict() {
        let arbiter = StaticArbiter::new("smalltalk");
        let verdict = arbiter.choose("hello", &[]).await.unwrap();
        assert_eq!(verdict, "smalltalk");
    }

    #[tokio::test]
    async fn in_memory_store_keeps_pairs_in_order() {
        let store = InMemoryStore::new();
        let first = RequestMessage::new("console", "one");
        let second = RequestMessage::new("console", "two");
        store
            .append(&first, &ResponseMessage::reply(&first, "1"))
            .await
            .unwrap();
        store
            .append(&second, &ResponseMessage::reply(&second, "2"))
            .await
            .unwrap();
        let entries = store.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0.content, "one");
        assert_eq!(entries[1].1.content, "2");
    }
}
