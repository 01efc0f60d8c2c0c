//! Embedding layer: attaches a content vector to the request context.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::interfaces::Embedder;
use crate::message::{RequestMessage, ResponseMessage};
use crate::pipeline::{ForwardOutcome, Layer};

/// Context key under which the embedding vector is stored.
pub const CONTEXT_EMBEDDING: &str = "embedding";

/// Calls the injected embedding provider on the forward pass.
///
/// Provider failure is logged and non-fatal by default: the request
/// continues without a vector. A layer configured `required` instead
/// answers the request with an error response.
pub struct EmbeddingLayer {
    embedder: Arc<dyn Embedder>,
    required: bool,
}

impl EmbeddingLayer {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            required: false,
        }
    }

    /// Treat a provider failure as fatal to the request.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

#[async_trait]
impl Layer for EmbeddingLayer {
    fn name(&self) -> &str {
        "embedding"
    }

    async fn tell(&self, mut request: RequestMessage) -> ForwardOutcome {
        match self.embedder.embed(&request.content).await {
            Ok(vector) => {
                request.insert_context(CONTEXT_EMBEDDING, json!(vector));
                ForwardOutcome::Next(request)
            }
            Err(error) if self.required => {
                log::warn!(
                    "embedding provider failed for request {}: {error:#}",
                    request.id()
                );
                ForwardOutcome::Respond(ResponseMessage::error(
                    request.id(),
                    "embedding provider unavailable",
                ))
            }
            Err(error) => {
                log::warn!(
                    "embedding provider failed for request {}, continuing without vector: {error:#}",
                    request.id()
                );
                ForwardOutcome::Next(request)
            }
        }
    }
}
