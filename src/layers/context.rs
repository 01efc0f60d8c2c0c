//! Context enrichment: static pairs on the way in, timing on the way out.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::message::{RequestMessage, ResponseMessage};
use crate::pipeline::{ForwardOutcome, Layer, ReverseOutcome};

/// Context key for the ingress timestamp.
pub const CONTEXT_RECEIVED_AT: &str = "received_at";
/// Metadata key for the end-to-end handling duration.
pub const META_HANDLED_MS: &str = "handled_ms";

/// Merges configured static context into every request and stamps the
/// handling duration onto every response.
///
/// Static pairs never clobber keys an earlier layer already set. The
/// forward pass parks a start instant keyed by request id; the matching
/// reverse pass (guaranteed by the executor) takes it back out, so the
/// in-flight table cannot grow unbounded.
pub struct ContextEnrichmentLayer {
    static_context: HashMap<String, Value>,
    inflight: DashMap<Uuid, Instant>,
}

impl ContextEnrichmentLayer {
    pub fn new(static_context: HashMap<String, Value>) -> Self {
        Self {
            static_context,
            inflight: DashMap::new(),
        }
    }
}

#[async_trait]
impl Layer for ContextEnrichmentLayer {
    fn name(&self) -> &str {
        "context_enrichment"
    }

    async fn tell(&self, mut request: RequestMessage) -> ForwardOutcome {
        for (key, value) in &self.static_context {
            request
                .context
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        request.insert_context(CONTEXT_RECEIVED_AT, json!(Utc::now().to_rfc3339()));
        self.inflight.insert(request.id(), Instant::now());
        ForwardOutcome::Next(request)
    }

    async fn respond(&self, mut response: ResponseMessage) -> ReverseOutcome {
        if let Some((_, started)) = self.inflight.remove(&response.request_id()) {
            response.metadata.insert(
                META_HANDLED_MS.to_string(),
                json!(started.elapsed().as_millis() as u64),
            );
        }
        ReverseOutcome::Pass(response)
    }
}
